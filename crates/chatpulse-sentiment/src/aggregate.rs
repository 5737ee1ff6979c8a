//! Per-label counts over a record log.

use std::collections::BTreeMap;

use crate::types::{Record, Sentiment};

/// Per-sentiment counts derived from a log snapshot.
///
/// Labels that never occur are absent from [`Aggregate::counts`].
/// `total` always equals the number of records aggregated and the sum of
/// all counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    counts: BTreeMap<Sentiment, usize>,
    total: usize,
}

impl Aggregate {
    #[must_use]
    pub fn counts(&self) -> &BTreeMap<Sentiment, usize> {
        &self.counts
    }

    #[must_use]
    pub fn count(&self, sentiment: Sentiment) -> usize {
        self.counts.get(&sentiment).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Share of records carrying `sentiment`, in `[0.0, 1.0]`.
    ///
    /// `None` when nothing was aggregated.
    #[must_use]
    pub fn proportion(&self, sentiment: Sentiment) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let share = self.count(sentiment) as f64 / self.total as f64;
        Some(share)
    }
}

/// Group records by sentiment and count them.
#[must_use]
pub fn aggregate(records: &[Record]) -> Aggregate {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.sentiment()).or_insert(0) += 1;
    }
    Aggregate {
        counts,
        total: records.len(),
    }
}
