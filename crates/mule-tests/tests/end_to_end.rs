//! CSV export → pipeline → graph, with a logistic model loaded from disk.

use std::fs;
use std::sync::Arc;

use mule_core::types::RiskTier;
use mule_graph::present::{node_title, risk_color};
use mule_pipeline::{read_transactions_path, HypotheticalTransfer, Pipeline, PipelineConfig};
use mule_score::{training_examples, LogisticOracle};
use mule_tests::helpers::*;

/// Probability rises with the CBI feature only.
const MODEL: &str = r#"{"weights":[0,0,0,0,0,8.0],"bias":-4.0}"#;

fn fixture() -> (tempfile::TempDir, Pipeline) {
    let dir = tempfile::tempdir().unwrap();
    let csv = csv_text(&[
        ("transfer", "30105", "28942", "494528.0", "19/07/2019 14:40", "1", "type1"),
        ("transfer", "30105", "8692", "494528.0", "19/07/2019 14:41", "1", "type1"),
        ("cash-in", "28942", "8692", "1200.5", "20/07/2019 09:00", "0", "none"),
        ("cash-in", "8692", "28942", "15.0", "21/07/2019", "0", ""),
        ("payment", "8692.0", "30105", "10.0", "22/07/2019 10:00:00", "0", ""),
    ]);
    let csv_path = dir.path().join("ML.csv");
    fs::write(&csv_path, csv).unwrap();
    let model_path = dir.path().join("model.json");
    fs::write(&model_path, MODEL).unwrap();

    let oracle = LogisticOracle::from_path(&model_path).unwrap();
    let pipeline = Pipeline::builder()
        .oracle(Arc::new(oracle))
        .config(PipelineConfig::default())
        .build()
        .unwrap();
    let batch = read_transactions_path(&csv_path).unwrap();
    pipeline.refresh(batch.transactions);
    (dir, pipeline)
}

#[test]
fn csv_batch_scores_every_account() {
    let (_dir, p) = fixture();
    let snap = p.snapshot();

    assert_eq!(snap.batch.len(), 5);
    // "8692.0" is a distinct raw id in the table
    assert_eq!(snap.table.len(), 4);
    assert_eq!(snap.table.total_tx_count(), 5);
    assert!(snap.failures.is_empty());

    let heavy = snap.table.get("30105").unwrap();
    assert_eq!(heavy.features.tx_count, 2);
    assert_eq!(heavy.features.unique_receivers, 2);
    assert_eq!(heavy.cbi, 1.0);
    // σ(8·1 − 4) ≈ 0.982
    assert_eq!(heavy.risk_tier(), Some(RiskTier::High));
}

#[test]
fn float_formatted_id_merges_into_node() {
    let (_dir, p) = fixture();
    let snap = p.snapshot();
    let g = &snap.graph;

    assert_eq!(g.node_count(), 3);
    assert_eq!(g.edge_count(), 5);
    assert_eq!(snap.diagnostics.merged_accounts.len(), 1);
    assert_eq!(snap.diagnostics.merged_accounts[0].account, "8692.0");
    assert_eq!(snap.diagnostics.merged_accounts[0].canonical, "8692");
    assert_eq!(g.edges_between("8692", "30105").len(), 1);
    assert!(snap.diagnostics.rejected_edges.is_empty());
}

#[test]
fn graph_views_render() {
    let (_dir, p) = fixture();
    let snap = p.snapshot();

    let node = snap.graph.node("30105").unwrap();
    assert_eq!(risk_color(node.risk_tier), "red");
    assert!(node_title(&node).contains("CBI: 1.000"));

    let fraud_edges = snap.graph.edges().filter(|e| e.fraud_label).count();
    assert_eq!(fraud_edges, 2);
    let dated = snap.graph.edges().nth(3).unwrap();
    assert_eq!(dated.timestamp, "2019-07-21 00:00:00");

    let json = serde_json::to_value(snap.graph.nodes().collect::<Vec<_>>()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[test]
fn what_if_against_csv_batch() {
    let (_dir, p) = fixture();
    let q = HypotheticalTransfer::new("28942", "30105", 2_000_000.0);
    let out = p.what_if_at(&q, ts()).unwrap();

    assert_eq!(out.record.features.tx_count, 2);
    assert_eq!(out.record.cbi, 1.0);
    assert_eq!(out.risk.tier, RiskTier::High);

    // stored table unchanged
    let stored = p.snapshot();
    assert_eq!(stored.table.get("28942").unwrap().features.tx_count, 1);
    assert_eq!(stored.table.get("28942").unwrap().risk_tier(), Some(RiskTier::Low));
}

#[test]
fn training_rows_follow_fraud_labels() {
    let (_dir, p) = fixture();
    let snap = p.snapshot();
    let rows = training_examples(&snap.table, &snap.batch);

    assert_eq!(rows.len(), snap.table.len());
    let positive: Vec<&str> = rows
        .iter()
        .filter(|r| r.label)
        .map(|r| r.account.as_str())
        .collect();
    assert_eq!(positive, vec!["30105"]);
}
