//! Display lookups for external renderers. Not part of graph semantics.

use mule_core::types::RiskTier;

use crate::graph::{EdgeView, NodeView};

pub const COLOR_LOW: &str = "green";
pub const COLOR_MEDIUM: &str = "orange";
pub const COLOR_HIGH: &str = "red";
pub const COLOR_UNKNOWN: &str = "grey";

/// Display color for a tier. Unclassified nodes are grey.
///
/// ```
/// use mule_core::types::RiskTier;
/// use mule_graph::present::risk_color;
/// assert_eq!(risk_color(Some(RiskTier::High)), "red");
/// assert_eq!(risk_color(None), "grey");
/// ```
pub fn risk_color(tier: Option<RiskTier>) -> &'static str {
    match tier {
        Some(RiskTier::Low) => COLOR_LOW,
        Some(RiskTier::Medium) => COLOR_MEDIUM,
        Some(RiskTier::High) => COLOR_HIGH,
        None => COLOR_UNKNOWN,
    }
}

/// Hover text for a node, values rounded to three decimals.
pub fn node_title(node: &NodeView<'_>) -> String {
    let tier = node.risk_tier.map_or("Unknown", |t| t.as_str());
    let prob = node
        .fraud_probability
        .map_or_else(|| "n/a".to_string(), |p| format!("{p:.3}"));
    format!(
        "Account: {}\nCBI: {:.3}\nRisk: {tier}\nFraud probability: {prob}",
        node.id, node.cbi
    )
}

/// Hover text for an edge.
pub fn edge_title(edge: &EdgeView<'_>) -> String {
    format!(
        "Amount: {}\nDate: {}\nFraud: {}",
        edge.amount,
        edge.timestamp,
        u8::from(edge.fraud_label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mule_core::types::TxId;

    #[test]
    fn every_tier_has_a_color() {
        assert_eq!(risk_color(Some(RiskTier::Low)), "green");
        assert_eq!(risk_color(Some(RiskTier::Medium)), "orange");
        assert_eq!(risk_color(Some(RiskTier::High)), "red");
        assert_eq!(risk_color(None), "grey");
    }

    #[test]
    fn node_title_rounds() {
        let node = NodeView {
            id: "42",
            cbi: 0.123456,
            risk_tier: Some(RiskTier::High),
            fraud_probability: Some(0.98765),
        };
        assert_eq!(
            node_title(&node),
            "Account: 42\nCBI: 0.123\nRisk: High\nFraud probability: 0.988"
        );
    }

    #[test]
    fn unclassified_node_title() {
        let node = NodeView {
            id: "9",
            cbi: 0.0,
            risk_tier: None,
            fraud_probability: None,
        };
        assert!(node_title(&node).ends_with("Risk: Unknown\nFraud probability: n/a"));
    }

    #[test]
    fn edge_title_shows_label() {
        let edge = EdgeView {
            tx: TxId(0),
            source: "1",
            destination: "2",
            amount: 250.5,
            timestamp: "2020-01-05 13:04:00",
            fraud_label: true,
        };
        assert_eq!(
            edge_title(&edge),
            "Amount: 250.5\nDate: 2020-01-05 13:04:00\nFraud: 1"
        );
    }
}
