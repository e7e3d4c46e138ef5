//! Composite behavioral index (CBI).
//!
//! `CBIraw` is a weighted sum of account features; `CBI` is `CBIraw` min-max
//! normalized over the whole population handed to [`CompositeIndexScorer::score`].
//!
//! Because normalization depends on the population, CBI values from two
//! different batches (for example a stored batch and the same batch plus one
//! what-if transfer) are not comparable: adding a single account can move
//! every other account's CBI.

use mule_core::policy::CbiWeights;
use mule_core::types::{AccountFeatureRecord, AccountFeatures, FeatureTable};
use tracing::debug;

use crate::aggregate::AggregatedFeatures;

/// Observed `CBIraw` bounds of a population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CbiRange {
    pub min: f64,
    pub max: f64,
}

impl CbiRange {
    /// All raw values equal: every CBI collapses to 0.
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }
}

/// Min-max normalize `raw` into `[0, 1]`.
///
/// Returns all zeros when every value is equal, and `None` for the range when
/// `raw` is empty.
pub fn normalize(raw: &[f64]) -> (Vec<f64>, Option<CbiRange>) {
    if raw.is_empty() {
        return (Vec::new(), None);
    }
    let range = CbiRange {
        min: raw.iter().copied().fold(f64::INFINITY, f64::min),
        max: raw.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    if range.is_degenerate() {
        return (vec![0.0; raw.len()], Some(range));
    }
    let span = range.max - range.min;
    let normalized = raw
        .iter()
        .map(|v| ((v - range.min) / span).clamp(0.0, 1.0))
        .collect();
    (normalized, Some(range))
}

/// Derives `CBIraw` and normalized `CBI` for a full batch population.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeIndexScorer {
    weights: CbiWeights,
}

impl CompositeIndexScorer {
    pub fn new(weights: CbiWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &CbiWeights {
        &self.weights
    }

    /// Weighted, unnormalized index for one account.
    pub fn raw(&self, f: &AccountFeatures) -> f64 {
        let w = &self.weights;
        w.tx_count * f.tx_count as f64
            + w.total_sent * f.total_sent
            + w.unique_receivers * f.unique_receivers as f64
            + w.unique_senders * f.unique_senders as f64
            + w.avg_amount * f.avg_amount
    }

    /// Score every account. Risk annotations are left empty.
    ///
    /// Must see the complete population: min and max are taken over all of it.
    pub fn score(&self, features: AggregatedFeatures) -> FeatureTable {
        let raw: Vec<f64> = features.values().map(|f| self.raw(f)).collect();
        let (cbi, range) = normalize(&raw);

        if let Some(range) = range {
            debug!(
                accounts = raw.len(),
                min = range.min,
                max = range.max,
                degenerate = range.is_degenerate(),
                "normalized composite index"
            );
        }

        features
            .into_iter()
            .zip(raw)
            .zip(cbi)
            .map(|(((account, features), cbi_raw), cbi)| AccountFeatureRecord {
                account,
                features,
                cbi_raw,
                cbi,
                risk: None,
            })
            .collect()
    }
}
