//! Per-account sender/receiver aggregation.
//!
//! Each account gets an [`AccountAccumulator`]; accumulators form a
//! commutative monoid under [`AccountAccumulator::merge`], so the batch can be
//! folded in any order or in parallel chunks and reduced to the same result.
//! Amount sums are integer micro-units, which keeps the merge exactly
//! associative.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use mule_core::types::{units_to_f64, AccountFeatures, AccountId, Transaction};
use rayon::prelude::*;
use tracing::debug;

/// Aggregated features keyed by account, in account order.
pub type AggregatedFeatures = BTreeMap<AccountId, AccountFeatures>;

/// Partial statistics for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountAccumulator {
    sent_count: u64,
    sent_units: u128,
    receivers: BTreeSet<AccountId>,
    received_count: u64,
    received_units: u128,
    senders: BTreeSet<AccountId>,
}

impl AccountAccumulator {
    /// Account is the source of `tx`.
    pub fn record_sent(&mut self, tx: &Transaction) {
        self.sent_count += 1;
        self.sent_units = self.sent_units.saturating_add(tx.amount.units());
        if !self.receivers.contains(&tx.destination) {
            self.receivers.insert(tx.destination.clone());
        }
    }

    /// Account is the destination of `tx`.
    pub fn record_received(&mut self, tx: &Transaction) {
        self.received_count += 1;
        self.received_units = self.received_units.saturating_add(tx.amount.units());
        if !self.senders.contains(&tx.source) {
            self.senders.insert(tx.source.clone());
        }
    }

    /// Combine another partial for the same account into this one.
    pub fn merge(&mut self, other: Self) {
        self.sent_count += other.sent_count;
        self.sent_units = self.sent_units.saturating_add(other.sent_units);
        self.receivers.extend(other.receivers);
        self.received_count += other.received_count;
        self.received_units = self.received_units.saturating_add(other.received_units);
        self.senders.extend(other.senders);
    }

    pub fn merged(mut self, other: Self) -> Self {
        self.merge(other);
        self
    }

    pub fn features(&self) -> AccountFeatures {
        let total_sent = units_to_f64(self.sent_units);
        let avg_amount = if self.sent_count == 0 {
            0.0
        } else {
            total_sent / self.sent_count as f64
        };
        AccountFeatures {
            tx_count: self.sent_count,
            total_sent,
            avg_amount,
            unique_receivers: self.receivers.len() as u64,
            rx_count: self.received_count,
            total_received: units_to_f64(self.received_units),
            unique_senders: self.senders.len() as u64,
        }
    }
}

type Partials = HashMap<AccountId, AccountAccumulator>;

fn accumulate(mut partials: Partials, tx: &Transaction) -> Partials {
    partials
        .entry(tx.source.clone())
        .or_default()
        .record_sent(tx);
    partials
        .entry(tx.destination.clone())
        .or_default()
        .record_received(tx);
    partials
}

fn merge_partials(a: Partials, b: Partials) -> Partials {
    let (mut large, small) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    for (account, acc) in small {
        large.entry(account).or_default().merge(acc);
    }
    large
}

fn finish(partials: Partials) -> AggregatedFeatures {
    partials
        .into_iter()
        .map(|(account, acc)| (account, acc.features()))
        .collect()
}

/// Computes per-account features from a transaction batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAggregator;

impl FeatureAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Parallel fold/reduce over the batch on the current rayon pool.
    ///
    /// Produces exactly one entry per account appearing as source or destination.
    pub fn aggregate(&self, batch: &[Transaction]) -> AggregatedFeatures {
        let partials = batch
            .par_iter()
            .fold(Partials::new, accumulate)
            .reduce(Partials::new, merge_partials);
        let features = finish(partials);
        debug!(
            transactions = batch.len(),
            accounts = features.len(),
            "aggregated account features"
        );
        features
    }

    /// Single-threaded equivalent of [`aggregate`](Self::aggregate).
    pub fn aggregate_sequential(&self, batch: &[Transaction]) -> AggregatedFeatures {
        finish(batch.iter().fold(Partials::new(), accumulate))
    }
}
