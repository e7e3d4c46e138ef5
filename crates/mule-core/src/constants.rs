//! Policy constants. Amounts are fixed-point micro-units (1.0 = 10^6 units).

/// Fixed-point denominator for [`Amount`](crate::types::Amount).
pub const AMOUNT_PRECISION: u64 = 1_000_000;

/// Largest representable amount, in whole currency units: `u128::MAX`
/// micro-units.
///
/// # Examples
///
/// ```
/// use mule_core::constants::MAX_AMOUNT;
/// assert!(MAX_AMOUNT > 3.0e32);
/// ```
pub const MAX_AMOUNT: f64 = u128::MAX as f64 / AMOUNT_PRECISION as f64;

/// Number of features the oracle is keyed on.
pub const FEATURE_COUNT: usize = 6;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "tx_count",
    "total_sent",
    "avg_amount",
    "unique_receivers",
    "unique_senders",
    "cbi",
];

pub const CBI_WEIGHT_TX_COUNT: f64 = 0.25;
pub const CBI_WEIGHT_TOTAL_SENT: f64 = 0.30;
pub const CBI_WEIGHT_UNIQUE_RECEIVERS: f64 = 0.20;
pub const CBI_WEIGHT_UNIQUE_SENDERS: f64 = 0.15;
pub const CBI_WEIGHT_AVG_AMOUNT: f64 = 0.10;

/// Probability strictly above this is `High`.
pub const RISK_HIGH_THRESHOLD: f64 = 0.7;

/// Probability strictly above this (and not `High`) is `Medium`.
pub const RISK_MEDIUM_THRESHOLD: f64 = 0.4;

/// Canonical textual form of transaction timestamps on graph edges.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use mule_core::constants::TIMESTAMP_FORMAT;
/// let ts = NaiveDate::from_ymd_opt(2020, 1, 5).unwrap().and_hms_opt(13, 4, 0).unwrap();
/// assert_eq!(ts.format(TIMESTAMP_FORMAT).to_string(), "2020-01-05 13:04:00");
/// ```
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Action label given to synthetic what-if transactions.
pub const HYPOTHETICAL_ACTION_LABEL: &str = "TEST";
