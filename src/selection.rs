use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::dataset::Dataset;
use crate::due::DueModel;
use crate::item::Weights;
use crate::priority::{self, Candidate};

/// Upper bounds on the summed weight of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    pub max_total_weight: u32,
    pub max_review_weight: u32,
    pub max_new_weight: u32,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_total_weight: 250,
            max_review_weight: 220,
            max_new_weight: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Indices into `Dataset::items`, in presentation order.
    pub items: Vec<usize>,
    pub review_count: usize,
    pub review_weight: u32,
    pub new_count: usize,
    pub new_weight: u32,
    /// Reviews that were due, selected or not.
    pub due_reviews: usize,
}

impl Selection {
    pub fn total_weight(&self) -> u32 {
        self.review_weight + self.new_weight
    }
}

/// Every item due at `now`, unordered.
pub fn candidates<R: Rng>(
    dataset: &Dataset,
    model: &DueModel,
    weights: &Weights,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Candidate> {
    dataset
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| model.is_due(&item.history, now))
        .map(|(index, item)| Candidate {
            index,
            level: item.history.current_level(),
            lesson: item.lesson(),
            practice_order: item.practice_order(),
            weight: item.weight(weights),
            last_review: item.history.last_review(),
            lateness: model.lateness(&item.history, now),
            tie_break: rng.random(),
        })
        .collect()
}

/// Takes items in order while they fit. An item that would overflow its own
/// bucket or the total is skipped and the scan goes on, so a full new-item
/// bucket does not stop reviews from being admitted and vice versa. The scan
/// stops once the total budget is used up.
pub fn select(sorted: &[Candidate], budget: &Budget) -> Selection {
    let mut selection = Selection {
        due_reviews: sorted.iter().filter(|c| !c.is_new()).count(),
        ..Default::default()
    };
    for candidate in sorted {
        if selection.total_weight() >= budget.max_total_weight {
            break;
        }
        let weight = candidate.weight;
        if selection.total_weight() + weight > budget.max_total_weight {
            continue;
        }
        let (spent, count, limit) = if candidate.is_new() {
            (
                &mut selection.new_weight,
                &mut selection.new_count,
                budget.max_new_weight,
            )
        } else {
            (
                &mut selection.review_weight,
                &mut selection.review_count,
                budget.max_review_weight,
            )
        };
        if *spent + weight > limit {
            continue;
        }
        *spent += weight;
        *count += 1;
        selection.items.push(candidate.index);
    }
    selection
}

/// Filters, orders and trims the items due at `now`.
///
/// Without a seed, tie-breaks are seeded from the clock so equal reviews come up
/// in a different order on each run.
pub fn plan_session(
    dataset: &Dataset,
    config: &Config,
    now: DateTime<Utc>,
    seed: Option<u64>,
) -> Selection {
    let seed = seed.unwrap_or_else(|| {
        Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros()) as u64
    });
    let mut rng = StdRng::seed_from_u64(seed);
    let model = config.due_model();
    let mut due = candidates(dataset, &model, &config.weights, now, &mut rng);
    priority::sort(&mut due);
    let selection = select(&due, &config.budget);
    info!("{} entries to review", selection.due_reviews);
    debug!(
        "selected {} reviews (weight {}) and {} new (weight {}) from {} due",
        selection.review_count,
        selection.review_weight,
        selection.new_count,
        selection.new_weight,
        due.len()
    );
    selection
}
