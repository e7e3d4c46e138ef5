//! Risk classification over a probability oracle.
//!
//! Per-account failures never abort the batch: a failed account keeps its
//! features and CBI but gets no risk annotation, and the failure is listed in
//! the [`ClassificationReport`].

use std::sync::Arc;

use mule_core::error::{ClassificationError, FeatureVectorError};
use mule_core::policy::RiskThresholds;
use mule_core::traits::ProbabilityOracle;
use mule_core::types::{AccountFeatureRecord, FeatureTable, RiskAssessment};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Annotated table plus the accounts that could not be classified.
#[derive(Debug, Clone, Default)]
pub struct ClassificationReport {
    pub table: FeatureTable,
    pub failures: Vec<ClassificationError>,
}

impl ClassificationReport {
    pub fn classified_count(&self) -> usize {
        self.table.records().filter(|r| r.risk.is_some()).count()
    }
}

/// Maps oracle probabilities to [`RiskAssessment`]s.
#[derive(Clone)]
pub struct RiskClassifier {
    oracle: Arc<dyn ProbabilityOracle>,
    thresholds: RiskThresholds,
}

impl std::fmt::Debug for RiskClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskClassifier")
            .field("oracle", &self.oracle.name())
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

impl RiskClassifier {
    pub fn new(oracle: Arc<dyn ProbabilityOracle>) -> Self {
        Self {
            oracle,
            thresholds: RiskThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Fraud probability and tier for one account.
    ///
    /// Fails on a non-finite feature, an arity mismatch with the oracle, an
    /// oracle error (timeout, cancellation, outage) or an out-of-range probability.
    pub fn classify(
        &self,
        record: &AccountFeatureRecord,
    ) -> Result<RiskAssessment, ClassificationError> {
        let account = || record.account.to_string();
        let vector = record.feature_vector();

        let expected = self.oracle.arity();
        if vector.len() != expected {
            return Err(ClassificationError::InvalidFeatureVector {
                account: account(),
                reason: FeatureVectorError::ArityMismatch {
                    expected,
                    got: vector.len(),
                },
            });
        }
        if let Some(feature) = vector.first_non_finite() {
            return Err(ClassificationError::InvalidFeatureVector {
                account: account(),
                reason: FeatureVectorError::NonFinite { feature },
            });
        }

        let p = self
            .oracle
            .probability(&vector)
            .map_err(|source| ClassificationError::Oracle {
                account: account(),
                source,
            })?;
        if !(0.0..=1.0).contains(&p) {
            return Err(ClassificationError::ProbabilityOutOfRange {
                account: account(),
                value: p,
            });
        }

        Ok(RiskAssessment {
            fraud_probability: p,
            tier: self.thresholds.tier(p),
        })
    }

    /// Classify every account in parallel on the current rayon pool.
    pub fn classify_table(&self, mut table: FeatureTable) -> ClassificationReport {
        let outcomes: Vec<Result<RiskAssessment, ClassificationError>> = table
            .records()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|record| self.classify(record))
            .collect();

        let mut failures = Vec::new();
        for (record, outcome) in table.records_mut().zip(outcomes) {
            match outcome {
                Ok(risk) => record.risk = Some(risk),
                Err(e) => {
                    debug!(account = %record.account, error = %e, "account excluded from risk output");
                    record.risk = None;
                    failures.push(e);
                }
            }
        }

        let report = ClassificationReport { table, failures };
        if report.failures.is_empty() {
            info!(
                oracle = self.oracle.name(),
                classified = report.classified_count(),
                "classified accounts"
            );
        } else {
            warn!(
                oracle = self.oracle.name(),
                classified = report.classified_count(),
                failed = report.failures.len(),
                "classified accounts with failures"
            );
        }
        report
    }
}
