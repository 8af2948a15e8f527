use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// A due item together with everything the ordering looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Position in `Dataset::items`.
    pub index: usize,
    pub level: u32,
    pub lesson: u32,
    pub practice_order: u8,
    pub weight: u32,
    pub last_review: DateTime<Utc>,
    /// `None` for new items.
    pub lateness: Option<f64>,
    /// Drawn once per planning run; decides between otherwise equal reviews.
    pub tie_break: u64,
}

impl Candidate {
    pub fn is_new(&self) -> bool {
        self.level == 0
    }

    pub fn is_late(&self) -> bool {
        self.lateness.is_some_and(|late| late > 0.0)
    }
}

/// Review order, most urgent first.
///
/// Reviews come before new items. Reviews that are still within their grace
/// period go by level, then lesson; once an item is past grace it goes by how
/// late it is. New items follow the curriculum: lesson, then variant order, then
/// creation time.
pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    match (a.is_new(), b.is_new()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => a
            .lesson
            .cmp(&b.lesson)
            .then(a.practice_order.cmp(&b.practice_order))
            .then(a.last_review.cmp(&b.last_review)),
        (false, false) => compare_reviews(a, b),
    }
}

fn compare_reviews(a: &Candidate, b: &Candidate) -> Ordering {
    if !a.is_late() && !b.is_late() {
        return a
            .level
            .cmp(&b.level)
            .then(a.lesson.cmp(&b.lesson))
            .then(a.tie_break.cmp(&b.tie_break));
    }
    let late_a = a.lateness.unwrap_or(0.0);
    let late_b = b.lateness.unwrap_or(0.0);
    late_b
        .total_cmp(&late_a)
        .then(a.lesson.cmp(&b.lesson))
        .then(a.tie_break.cmp(&b.tie_break))
}

pub fn sort(candidates: &mut [Candidate]) {
    candidates.sort_by(compare);
}
