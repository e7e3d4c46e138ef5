//! Replaceable scoring policy: CBI weights and risk-tier thresholds.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CBI_WEIGHT_AVG_AMOUNT, CBI_WEIGHT_TOTAL_SENT, CBI_WEIGHT_TX_COUNT,
    CBI_WEIGHT_UNIQUE_RECEIVERS, CBI_WEIGHT_UNIQUE_SENDERS, RISK_HIGH_THRESHOLD,
    RISK_MEDIUM_THRESHOLD,
};
use crate::types::RiskTier;

/// Weights of the composite behavioral index.
///
/// `CBIraw = tx_count·w₁ + total_sent·w₂ + unique_receivers·w₃ + unique_senders·w₄ + avg_amount·w₅`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct CbiWeights {
    pub tx_count: f64,
    pub total_sent: f64,
    pub unique_receivers: f64,
    pub unique_senders: f64,
    pub avg_amount: f64,
}

pub const DEFAULT_CBI_WEIGHTS: CbiWeights = CbiWeights {
    tx_count: CBI_WEIGHT_TX_COUNT,
    total_sent: CBI_WEIGHT_TOTAL_SENT,
    unique_receivers: CBI_WEIGHT_UNIQUE_RECEIVERS,
    unique_senders: CBI_WEIGHT_UNIQUE_SENDERS,
    avg_amount: CBI_WEIGHT_AVG_AMOUNT,
};

impl Default for CbiWeights {
    fn default() -> Self {
        DEFAULT_CBI_WEIGHTS
    }
}

impl CbiWeights {
    /// All weights finite.
    pub fn is_valid(&self) -> bool {
        [
            self.tx_count,
            self.total_sent,
            self.unique_receivers,
            self.unique_senders,
            self.avg_amount,
        ]
        .iter()
        .all(|w| w.is_finite())
    }
}

/// Probability cut points for [`RiskTier`]. Each band is closed on its upper edge.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct RiskThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: RISK_HIGH_THRESHOLD,
            medium: RISK_MEDIUM_THRESHOLD,
        }
    }
}

impl RiskThresholds {
    /// `p > high` → High, `medium < p <= high` → Medium, otherwise Low.
    pub fn tier(&self, p: f64) -> RiskTier {
        if p > self.high {
            RiskTier::High
        } else if p > self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    /// `0 <= medium <= high <= 1`.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.medium)
            && (0.0..=1.0).contains(&self.high)
            && self.medium <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_match_constants() {
        let w = CbiWeights::default();
        assert_eq!(w.tx_count, 0.25);
        assert_eq!(w.total_sent, 0.30);
        assert_eq!(w.unique_receivers, 0.20);
        assert_eq!(w.unique_senders, 0.15);
        assert_eq!(w.avg_amount, 0.10);
        assert!(w.is_valid());
    }

    #[test]
    fn nan_weight_is_invalid() {
        let w = CbiWeights {
            avg_amount: f64::NAN,
            ..CbiWeights::default()
        };
        assert!(!w.is_valid());
    }

    #[test]
    fn boundaries_are_strict_on_upper_edge() {
        let t = RiskThresholds::default();
        assert_eq!(t.tier(0.7), RiskTier::Medium);
        assert_eq!(t.tier(0.4), RiskTier::Low);
        assert_eq!(t.tier(0.7000001), RiskTier::High);
        assert_eq!(t.tier(0.4000001), RiskTier::Medium);
        assert_eq!(t.tier(0.0), RiskTier::Low);
        assert_eq!(t.tier(1.0), RiskTier::High);
    }

    #[test]
    fn inverted_thresholds_are_invalid() {
        let t = RiskThresholds {
            high: 0.3,
            medium: 0.6,
        };
        assert!(!t.is_valid());
        assert!(RiskThresholds::default().is_valid());
    }

    #[test]
    fn partial_weights_deserialize_with_defaults() {
        let w: CbiWeights = serde_json::from_str(r#"{"total_sent": 0.5}"#).unwrap();
        assert_eq!(w.total_sent, 0.5);
        assert_eq!(w.tx_count, 0.25);
    }
}
