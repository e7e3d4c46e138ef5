//! Hypothetical-transfer evaluation.
//!
//! The batch is copied, extended with one synthetic transfer and re-scored
//! from scratch. CBI is min-max normalized over that extended population, so
//! a what-if result is not directly comparable with the stored table: adding
//! one transfer can move the CBI range and with it the CBI of every account.

use chrono::{Local, NaiveDateTime};
use mule_core::error::WhatIfError;
use mule_core::types::{AccountFeatureRecord, AccountId, Amount, RiskAssessment, Transaction};
use mule_score::{CompositeIndexScorer, FeatureAggregator, RiskClassifier};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raw query input: who would send how much to whom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypotheticalTransfer {
    pub source: String,
    pub destination: String,
    pub amount: f64,
}

impl HypotheticalTransfer {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, amount: f64) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            amount,
        }
    }
}

/// The source account's record and risk in the extended batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfOutcome {
    pub record: AccountFeatureRecord,
    pub risk: RiskAssessment,
}

#[derive(Debug, Clone)]
pub struct WhatIfEvaluator {
    aggregator: FeatureAggregator,
    scorer: CompositeIndexScorer,
    classifier: RiskClassifier,
}

impl WhatIfEvaluator {
    pub fn new(scorer: CompositeIndexScorer, classifier: RiskClassifier) -> Self {
        Self {
            aggregator: FeatureAggregator::new(),
            scorer,
            classifier,
        }
    }

    /// Evaluate with the synthetic transfer stamped at the current local time.
    pub fn evaluate(
        &self,
        batch: &[Transaction],
        transfer: &HypotheticalTransfer,
    ) -> Result<WhatIfOutcome, WhatIfError> {
        self.evaluate_at(batch, transfer, Local::now().naive_local())
    }

    /// Evaluate with an explicit timestamp for the synthetic transfer.
    ///
    /// `batch` is only read. The extension happens on a private copy.
    pub fn evaluate_at(
        &self,
        batch: &[Transaction],
        transfer: &HypotheticalTransfer,
        timestamp: NaiveDateTime,
    ) -> Result<WhatIfOutcome, WhatIfError> {
        let source = AccountId::new(&transfer.source)
            .map_err(|_| WhatIfError::AccountNotFound(transfer.source.clone()))?;
        let destination = AccountId::new(&transfer.destination)
            .map_err(|e| WhatIfError::InvalidTransfer(format!("destination: {e}")))?;
        let amount = Amount::from_f64(transfer.amount)
            .map_err(|e| WhatIfError::InvalidTransfer(format!("amount: {e}")))?;

        let mut extended = Vec::with_capacity(batch.len() + 1);
        extended.extend_from_slice(batch);
        extended.push(Transaction::hypothetical(
            source.clone(),
            destination,
            amount,
            timestamp,
        ));

        let table = self.scorer.score(self.aggregator.aggregate(&extended));
        let mut record = table
            .get(source.as_str())
            .cloned()
            .ok_or_else(|| WhatIfError::AccountNotFound(source.to_string()))?;
        let risk = self.classifier.classify(&record)?;
        record.risk = Some(risk);

        debug!(
            account = %source,
            probability = risk.fraud_probability,
            tier = %risk.tier,
            "evaluated hypothetical transfer"
        );
        Ok(WhatIfOutcome { record, risk })
    }
}
