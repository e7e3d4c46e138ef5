//! Builds the annotated [`TransactionGraph`] from a classified feature table
//! and the batch it was computed from.
//!
//! Canonicalization runs in parallel. Nodes are then inserted in account order
//! and edges in batch order by a single writer.

use std::collections::HashMap;

use mule_core::canonical::canonicalize;
use mule_core::constants::TIMESTAMP_FORMAT;
use mule_core::error::CanonicalizationError;
use mule_core::types::{FeatureTable, Transaction, TxId};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::graph::{AccountNode, TransactionGraph, TransferEdge};

/// An account left out of the node set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncanonicalAccount {
    pub account: String,
    pub reason: String,
}

/// An account whose canonical id was already taken by an earlier account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedAccount {
    pub account: String,
    pub canonical: String,
}

/// What the builder dropped or merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphDiagnostics {
    pub uncanonical_accounts: Vec<UncanonicalAccount>,
    pub merged_accounts: Vec<MergedAccount>,
    /// Transactions with an endpoint that failed canonicalization.
    pub rejected_edges: Vec<TxId>,
}

impl GraphDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.uncanonical_accounts.is_empty()
            && self.merged_accounts.is_empty()
            && self.rejected_edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionGraphBuilder;

impl TransactionGraphBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        table: &FeatureTable,
        batch: &[Transaction],
    ) -> (TransactionGraph, GraphDiagnostics) {
        let mut graph = TransactionGraph::new();
        let mut diagnostics = GraphDiagnostics::default();

        let canonical: Vec<(&str, Result<String, CanonicalizationError>)> = table
            .records()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|record| {
                let raw = record.account.as_str();
                (raw, canonicalize(raw))
            })
            .collect();

        let mut resolved: HashMap<&str, Option<String>> = HashMap::with_capacity(canonical.len());
        for (raw, outcome) in canonical {
            match outcome {
                Ok(id) => {
                    let record = table.get(raw);
                    let node = AccountNode {
                        id: id.clone(),
                        cbi: record.map_or(0.0, |r| r.cbi),
                        risk: record.and_then(|r| r.risk),
                    };
                    let (_, inserted) = graph.insert_node(node);
                    if !inserted {
                        debug!(account = raw, canonical = %id, "account merged into existing node");
                        diagnostics.merged_accounts.push(MergedAccount {
                            account: raw.to_string(),
                            canonical: id.clone(),
                        });
                    }
                    resolved.insert(raw, Some(id));
                }
                Err(e) => {
                    debug!(account = raw, error = %e, "account omitted from graph");
                    diagnostics.uncanonical_accounts.push(UncanonicalAccount {
                        account: raw.to_string(),
                        reason: e.to_string(),
                    });
                    resolved.insert(raw, None);
                }
            }
        }

        for (i, tx) in batch.iter().enumerate() {
            let endpoint = |raw: &str| -> Option<String> {
                match resolved.get(raw) {
                    Some(id) => id.clone(),
                    None => canonicalize(raw).ok(),
                }
            };
            let edge = TransferEdge {
                tx: TxId(i),
                amount: tx.amount.as_f64(),
                timestamp: tx.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                fraud_label: tx.is_fraud,
            };
            let inserted = match (endpoint(tx.source.as_str()), endpoint(tx.destination.as_str())) {
                (Some(src), Some(dst)) => graph.insert_edge(&src, &dst, edge).is_some(),
                _ => false,
            };
            if !inserted {
                diagnostics.rejected_edges.push(TxId(i));
            }
        }

        if diagnostics.is_clean() {
            info!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "built transaction graph"
            );
        } else {
            warn!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                uncanonical = diagnostics.uncanonical_accounts.len(),
                merged = diagnostics.merged_accounts.len(),
                rejected_edges = diagnostics.rejected_edges.len(),
                "built transaction graph with diagnostics"
            );
        }
        (graph, diagnostics)
    }
}
