use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::DrillError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 0 means new or forgotten
    pub level: u32,
    pub time: DateTime<Utc>,
}

/// Append-only review log of a single practice item, oldest first.
///
/// A history is never empty: it is seeded with a level 0 entry when the item is
/// created, and a stored history without entries is rejected on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HistoryEntry>", into = "Vec<HistoryEntry>")]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new(created: DateTime<Utc>) -> Self {
        Self {
            entries: vec![HistoryEntry {
                level: 0,
                time: created,
            }],
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn last(&self) -> &HistoryEntry {
        self.entries.last().expect("history is never empty")
    }

    pub fn current_level(&self) -> u32 {
        self.last().level
    }

    pub fn last_review(&self) -> DateTime<Utc> {
        self.last().time
    }

    pub fn is_new(&self) -> bool {
        self.current_level() == 0
    }

    pub fn level_up(&mut self, now: DateTime<Utc>) -> HistoryEntry {
        self.push(self.current_level() + 1, now)
    }

    pub fn reset(&mut self, now: DateTime<Utc>) -> HistoryEntry {
        self.push(0, now)
    }

    fn push(&mut self, level: u32, time: DateTime<Utc>) -> HistoryEntry {
        let entry = HistoryEntry { level, time };
        self.entries.push(entry);
        entry
    }
}

impl TryFrom<Vec<HistoryEntry>> for History {
    type Error = DrillError;

    fn try_from(entries: Vec<HistoryEntry>) -> Result<Self, Self::Error> {
        if entries.is_empty() {
            return Err(DrillError::EmptyHistory);
        }
        Ok(Self { entries })
    }
}

impl From<History> for Vec<HistoryEntry> {
    fn from(history: History) -> Self {
        history.entries
    }
}

/// Number of answered reviews per calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReport {
    pub days: Vec<(NaiveDate, usize)>,
    pub total: usize,
}

impl ReviewReport {
    /// Level 0 entries are creations or resets, not successful recalls, and are
    /// left out of the count.
    pub fn collect<'a, Tz: TimeZone>(
        histories: impl IntoIterator<Item = &'a History>,
        tz: &Tz,
    ) -> Self {
        let counts = histories
            .into_iter()
            .flat_map(History::entries)
            .filter(|entry| entry.level > 0)
            .map(|entry| entry.time.with_timezone(tz).date_naive())
            .counts();
        let days = counts.into_iter().sorted().collect_vec();
        let total = days.iter().map(|(_, n)| n).sum();
        Self { days, total }
    }

    pub fn estimated_time(&self, per_review: Duration) -> Duration {
        per_review * self.total as i32
    }
}
