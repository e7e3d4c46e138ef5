//! Training labels and examples for out-of-band oracle training.
//!
//! An account is labelled fraudulent when any of its outgoing transactions is
//! marked fraud. Accounts that never send default to non-fraudulent.

use std::collections::BTreeMap;

use mule_core::types::{AccountId, FeatureTable, FeatureVector, Transaction};
use serde::{Deserialize, Serialize};

/// One labelled row for an external trainer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrainingExample {
    pub account: AccountId,
    pub features: FeatureVector,
    pub label: bool,
}

/// Label for every account appearing in `batch`, as sender or receiver.
pub fn training_labels(batch: &[Transaction]) -> BTreeMap<AccountId, bool> {
    let mut labels = BTreeMap::new();
    for tx in batch {
        let sent = labels.entry(tx.source.clone()).or_insert(false);
        *sent |= tx.is_fraud;
        labels.entry(tx.destination.clone()).or_insert(false);
    }
    labels
}

/// Pair each scored account's feature vector with its label.
pub fn training_examples(table: &FeatureTable, batch: &[Transaction]) -> Vec<TrainingExample> {
    let labels = training_labels(batch);
    table
        .records()
        .map(|record| TrainingExample {
            account: record.account.clone(),
            features: record.feature_vector(),
            label: labels.get(&record.account).copied().unwrap_or(false),
        })
        .collect()
}
