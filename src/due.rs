use chrono::{DateTime, Duration, Utc};

use crate::history::History;

/// Highest level with its own interval; higher levels reuse this one.
pub const MAX_LEVEL: u32 = 12;
pub const DEFAULT_BASE: f64 = 2.25;
pub const DEFAULT_SLACK: f64 = 1.1;

const DAY_MILLIS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Maps a level to the wait before an item becomes reviewable again.
///
/// `interval(0)` is zero and `interval(L)` is one day times `base^(L-1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DueModel {
    intervals: Vec<Duration>,
    slack: f64,
}

impl Default for DueModel {
    fn default() -> Self {
        Self::new(DEFAULT_BASE, DEFAULT_SLACK)
    }
}

impl DueModel {
    pub fn new(base: f64, slack: f64) -> Self {
        let intervals = std::iter::once(Duration::zero())
            .chain((0..MAX_LEVEL as i32).map(|exp| {
                Duration::try_milliseconds((DAY_MILLIS * base.powi(exp)).round() as i64)
                    .unwrap_or(Duration::MAX)
            }))
            .collect();
        Self { intervals, slack }
    }

    pub fn interval(&self, level: u32) -> Duration {
        self.intervals[level.min(MAX_LEVEL) as usize]
    }

    /// Saturates at the latest representable time, which is never due.
    pub fn next_due(&self, history: &History) -> DateTime<Utc> {
        let last = history.last();
        last.time
            .checked_add_signed(self.interval(last.level))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_due(&self, history: &History, now: DateTime<Utc>) -> bool {
        self.next_due(history) < now
    }

    /// How many intervals past its grace period an item is. Non-positive values
    /// mean the item is still within grace. New items have no lateness.
    pub fn lateness(&self, history: &History, now: DateTime<Utc>) -> Option<f64> {
        let last = history.last();
        if last.level == 0 {
            return None;
        }
        let interval = self.interval(last.level).num_milliseconds() as f64;
        let elapsed = (now - last.time).num_milliseconds() as f64;
        Some((elapsed - interval * self.slack) / interval)
    }
}
