use std::fmt;

use chrono::{DateTime, Utc};
use strum::IntoEnumIterator;

use crate::dataset::Dataset;
use crate::due::DueModel;
use crate::item::Variant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantCounts {
    pub total: usize,
    pub new: usize,
    pub review: usize,
    /// New or review items due at the time of counting.
    pub due: usize,
}

/// Dataset overview printed by `drill stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub words: usize,
    pub blank_words: usize,
    pub variants: Vec<(Variant, VariantCounts)>,
}

impl Stats {
    pub fn collect(dataset: &Dataset, model: &DueModel, now: DateTime<Utc>) -> Self {
        let variants = Variant::iter()
            .map(|variant| {
                let counts = dataset
                    .items()
                    .iter()
                    .filter(|item| item.variant() == variant)
                    .fold(VariantCounts::default(), |mut counts, item| {
                        counts.total += 1;
                        if item.history.is_new() {
                            counts.new += 1;
                        } else {
                            counts.review += 1;
                        }
                        if model.is_due(&item.history, now) {
                            counts.due += 1;
                        }
                        counts
                    });
                (variant, counts)
            })
            .collect();
        Self {
            words: dataset.words().len(),
            blank_words: dataset.blank_words().len(),
            variants,
        }
    }

    pub fn items(&self) -> usize {
        self.variants.iter().map(|(_, c)| c.total).sum()
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} items, {} words ({} without text)",
            self.items(),
            self.words,
            self.blank_words
        )?;
        for (variant, c) in &self.variants {
            writeln!(
                f,
                "{:<12} {:>5} total {:>5} new {:>5} review {:>5} due",
                variant.to_string(),
                c.total,
                c.new,
                c.review,
                c.due
            )?;
        }
        Ok(())
    }
}
