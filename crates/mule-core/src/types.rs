//! Core data types: transactions, account features, risk annotations.
//!
//! Amounts are fixed-point integers ([`Amount`]) so that aggregation sums are
//! exact and independent of summation order.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{
    AMOUNT_PRECISION, FEATURE_COUNT, FEATURE_NAMES, HYPOTHETICAL_ACTION_LABEL, MAX_AMOUNT,
};
use crate::error::{AccountIdError, AmountError};
use crate::policy::RiskThresholds;

/// Opaque account identifier, as it appeared in the source records.
///
/// Never blank; surrounding whitespace is trimmed on construction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AccountIdError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AccountIdError::Blank);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

/// Non-negative transfer amount in micro-units (see [`AMOUNT_PRECISION`]).
///
/// Values are rounded to the nearest micro-unit, so an amount below half a
/// micro-unit (0.0000005) is stored as zero.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Convert a real-valued amount, rounding to the nearest micro-unit.
    ///
    /// # Examples
    ///
    /// ```
    /// use mule_core::types::Amount;
    /// assert_eq!(Amount::from_f64(12.5).unwrap().units(), 12_500_000);
    /// assert!(Amount::from_f64(-1.0).is_err());
    /// ```
    pub fn from_f64(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NonFinite);
        }
        if value < 0.0 {
            return Err(AmountError::Negative);
        }
        if value > MAX_AMOUNT {
            return Err(AmountError::TooLarge);
        }
        Ok(Self((value * AMOUNT_PRECISION as f64).round() as u128))
    }

    pub fn from_units(units: u128) -> Self {
        Self(units)
    }

    pub fn units(&self) -> u128 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        units_to_f64(self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

/// Convert a sum of micro-units back to a real value.
pub fn units_to_f64(units: u128) -> f64 {
    let whole = units / AMOUNT_PRECISION as u128;
    let frac = units % AMOUNT_PRECISION as u128;
    whole as f64 + frac as f64 / AMOUNT_PRECISION as f64
}

/// Identity of a transaction: its zero-based position in the batch.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TxId(pub usize);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// Numeric action type, resolved once at ingestion via an [`ActionCodebook`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct ActionCode(pub u32);

impl ActionCode {
    /// Reserved for synthetic what-if records.
    pub const HYPOTHETICAL: Self = Self(u32::MAX);
}

/// Lookup table from raw action labels to codes.
///
/// Codes are indexes into the lexicographically sorted set of distinct labels.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct ActionCodebook {
    labels: Vec<String>,
}

impl ActionCodebook {
    /// # Examples
    ///
    /// ```
    /// use mule_core::types::{ActionCode, ActionCodebook};
    /// let book = ActionCodebook::from_labels(["transfer", "cash-out", "transfer"]);
    /// assert_eq!(book.code("cash-out"), Some(ActionCode(0)));
    /// assert_eq!(book.code("transfer"), Some(ActionCode(1)));
    /// ```
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .collect();
        Self {
            labels: distinct.into_iter().collect(),
        }
    }

    pub fn code(&self, label: &str) -> Option<ActionCode> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label.trim()))
            .ok()
            .map(|i| ActionCode(i as u32))
    }

    /// Label for `code`; the reserved what-if code resolves to
    /// [`HYPOTHETICAL_ACTION_LABEL`].
    pub fn label(&self, code: ActionCode) -> Option<&str> {
        if code == ActionCode::HYPOTHETICAL {
            return Some(HYPOTHETICAL_ACTION_LABEL);
        }
        self.labels.get(code.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One observed transfer. Immutable once built.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    pub source: AccountId,
    pub destination: AccountId,
    pub amount: Amount,
    pub timestamp: NaiveDateTime,
    pub action: ActionCode,
    pub is_fraud: bool,
    pub fraud_type: Option<String>,
}

impl Transaction {
    /// A non-fraudulent transfer with action code 0.
    pub fn new(
        source: AccountId,
        destination: AccountId,
        amount: Amount,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            source,
            destination,
            amount,
            timestamp,
            action: ActionCode::default(),
            is_fraud: false,
            fraud_type: None,
        }
    }

    /// Synthetic record appended by what-if evaluation.
    pub fn hypothetical(
        source: AccountId,
        destination: AccountId,
        amount: Amount,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            action: ActionCode::HYPOTHETICAL,
            ..Self::new(source, destination, amount, timestamp)
        }
    }

    pub fn with_action(mut self, action: ActionCode) -> Self {
        self.action = action;
        self
    }

    pub fn with_fraud(mut self, fraud_type: Option<String>) -> Self {
        self.is_fraud = true;
        self.fraud_type = fraud_type;
        self
    }
}

/// Discrete risk tier derived from a fraud probability.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tier under the default thresholds (0.7 / 0.4, strict upper edge).
    ///
    /// # Examples
    ///
    /// ```
    /// use mule_core::types::RiskTier;
    /// assert_eq!(RiskTier::from_probability(0.71), RiskTier::High);
    /// assert_eq!(RiskTier::from_probability(0.7), RiskTier::Medium);
    /// assert_eq!(RiskTier::from_probability(0.4), RiskTier::Low);
    /// ```
    pub fn from_probability(p: f64) -> Self {
        RiskThresholds::default().tier(p)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output for one account.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RiskAssessment {
    pub fraud_probability: f64,
    pub tier: RiskTier,
}

/// Aggregated behavioral statistics for one account.
///
/// Sender-side fields are zero for accounts that only receive and vice versa.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct AccountFeatures {
    pub tx_count: u64,
    pub total_sent: f64,
    pub avg_amount: f64,
    pub unique_receivers: u64,
    pub rx_count: u64,
    pub total_received: f64,
    pub unique_senders: u64,
}

/// Ordered input to the probability oracle:
/// `[tx_count, total_sent, avg_amount, unique_receivers, unique_senders, cbi]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name of the first non-finite feature, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.0
            .iter()
            .zip(FEATURE_NAMES)
            .find(|(v, _)| !v.is_finite())
            .map(|(_, name)| name)
    }
}

/// Per-account row of the feature table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountFeatureRecord {
    pub account: AccountId,
    #[serde(flatten)]
    pub features: AccountFeatures,
    pub cbi_raw: f64,
    pub cbi: f64,
    /// `None` until classified, and for accounts excluded from classification.
    pub risk: Option<RiskAssessment>,
}

impl AccountFeatureRecord {
    pub fn feature_vector(&self) -> FeatureVector {
        let f = &self.features;
        FeatureVector::new([
            f.tx_count as f64,
            f.total_sent,
            f.avg_amount,
            f.unique_receivers as f64,
            f.unique_senders as f64,
            self.cbi,
        ])
    }

    pub fn fraud_probability(&self) -> Option<f64> {
        self.risk.map(|r| r.fraud_probability)
    }

    pub fn risk_tier(&self) -> Option<RiskTier> {
        self.risk.map(|r| r.tier)
    }
}

/// All accounts of one batch, ordered by account id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(transparent)]
pub struct FeatureTable {
    records: BTreeMap<AccountId, AccountFeatureRecord>,
}

impl FeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: AccountFeatureRecord) -> Option<AccountFeatureRecord> {
        self.records.insert(record.account.clone(), record)
    }

    pub fn get(&self, account: &str) -> Option<&AccountFeatureRecord> {
        self.records.get(account)
    }

    pub fn get_mut(&mut self, account: &str) -> Option<&mut AccountFeatureRecord> {
        self.records.get_mut(account)
    }

    pub fn contains(&self, account: &str) -> bool {
        self.records.contains_key(account)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &AccountFeatureRecord> {
        self.records.values()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut AccountFeatureRecord> {
        self.records.values_mut()
    }

    pub fn into_records(self) -> impl Iterator<Item = AccountFeatureRecord> {
        self.records.into_values()
    }

    /// Sum of `tx_count` over all accounts.
    pub fn total_tx_count(&self) -> u64 {
        self.records.values().map(|r| r.features.tx_count).sum()
    }

    /// Sum of `rx_count` over all accounts.
    pub fn total_rx_count(&self) -> u64 {
        self.records.values().map(|r| r.features.rx_count).sum()
    }
}

impl FromIterator<AccountFeatureRecord> for FeatureTable {
    fn from_iter<T: IntoIterator<Item = AccountFeatureRecord>>(iter: T) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap()
    }

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    // --- AccountId ---

    #[test]
    fn account_id_trims_whitespace() {
        assert_eq!(id("  1042 ").as_str(), "1042");
    }

    #[test]
    fn account_id_rejects_blank() {
        assert_eq!(AccountId::new(""), Err(AccountIdError::Blank));
        assert_eq!(AccountId::new("   \t"), Err(AccountIdError::Blank));
    }

    #[test]
    fn account_id_deserialize_validates() {
        let ok: AccountId = serde_json::from_str("\"77\"").unwrap();
        assert_eq!(ok.as_str(), "77");
        assert!(serde_json::from_str::<AccountId>("\"  \"").is_err());
    }

    // --- Amount ---

    #[test]
    fn amount_rounds_to_micro_units() {
        assert_eq!(Amount::from_f64(0.0000004).unwrap().units(), 0);
        assert_eq!(Amount::from_f64(0.0000006).unwrap().units(), 1);
        assert_eq!(
            Amount::from_f64(100.0).unwrap().units(),
            100 * AMOUNT_PRECISION as u128
        );
    }

    #[test]
    fn amount_rejects_invalid() {
        assert_eq!(Amount::from_f64(-0.5), Err(AmountError::Negative));
        assert_eq!(Amount::from_f64(f64::NAN), Err(AmountError::NonFinite));
        assert_eq!(Amount::from_f64(f64::INFINITY), Err(AmountError::NonFinite));
        assert_eq!(Amount::from_f64(MAX_AMOUNT * 2.0), Err(AmountError::TooLarge));
    }

    #[test]
    fn amount_accepts_beyond_u64_micro_units() {
        let a = Amount::from_f64(5.0e12).unwrap();
        assert_eq!(a.units(), 5_000_000_000_000 * AMOUNT_PRECISION as u128);
        assert_eq!(a.as_f64(), 5.0e12);
        assert!(Amount::from_f64(1.0e30).is_ok());
    }

    #[test]
    fn amount_as_f64_round_trips_whole_values() {
        assert_eq!(Amount::from_f64(300.0).unwrap().as_f64(), 300.0);
        assert_eq!(Amount::from_f64(12.25).unwrap().as_f64(), 12.25);
    }

    #[test]
    fn units_to_f64_handles_large_sums() {
        let sum = 3 * Amount::from_f64(1.0e12).unwrap().units();
        assert_eq!(units_to_f64(sum), 3.0e12);
    }

    // --- ActionCodebook ---

    #[test]
    fn codebook_codes_sorted_labels() {
        let book = ActionCodebook::from_labels(["transfer", "cash_in", "debit", "cash_in"]);
        assert_eq!(book.len(), 3);
        assert_eq!(book.code("cash_in"), Some(ActionCode(0)));
        assert_eq!(book.code("debit"), Some(ActionCode(1)));
        assert_eq!(book.code("transfer"), Some(ActionCode(2)));
        assert_eq!(book.code("payment"), None);
        assert_eq!(book.label(ActionCode(2)), Some("transfer"));
        assert_eq!(book.label(ActionCode(3)), None);
        assert_eq!(book.label(ActionCode::HYPOTHETICAL), Some("TEST"));
    }

    #[test]
    fn empty_codebook() {
        let book = ActionCodebook::from_labels(Vec::<String>::new());
        assert!(book.is_empty());
        assert_eq!(book.code("anything"), None);
        assert_eq!(book.label(ActionCode::HYPOTHETICAL), Some(HYPOTHETICAL_ACTION_LABEL));
    }

    // --- Transaction ---

    #[test]
    fn hypothetical_transaction_defaults() {
        let tx = Transaction::hypothetical(id("1"), id("2"), Amount::from_units(5), ts());
        assert!(!tx.is_fraud);
        assert_eq!(tx.fraud_type, None);
        assert_eq!(tx.action, ActionCode::HYPOTHETICAL);
    }

    #[test]
    fn with_fraud_sets_label() {
        let tx = Transaction::new(id("1"), id("2"), Amount::ZERO, ts())
            .with_fraud(Some("mule".into()));
        assert!(tx.is_fraud);
        assert_eq!(tx.fraud_type.as_deref(), Some("mule"));
    }

    // --- FeatureVector / records ---

    #[test]
    fn feature_vector_order() {
        let record = AccountFeatureRecord {
            account: id("9"),
            features: AccountFeatures {
                tx_count: 3,
                total_sent: 300.0,
                avg_amount: 100.0,
                unique_receivers: 2,
                rx_count: 1,
                total_received: 50.0,
                unique_senders: 1,
            },
            cbi_raw: 0.0,
            cbi: 0.5,
            risk: None,
        };
        assert_eq!(
            record.feature_vector().as_slice(),
            &[3.0, 300.0, 100.0, 2.0, 1.0, 0.5]
        );
        assert_eq!(record.risk_tier(), None);
    }

    #[test]
    fn feature_vector_reports_first_non_finite() {
        let v = FeatureVector::new([1.0, 2.0, f64::NAN, 4.0, f64::INFINITY, 0.0]);
        assert_eq!(v.first_non_finite(), Some("avg_amount"));
        let ok = FeatureVector::new([0.0; FEATURE_COUNT]);
        assert_eq!(ok.first_non_finite(), None);
    }

    #[test]
    fn feature_table_lookup_by_str() {
        let table: FeatureTable = ["b", "a"]
            .into_iter()
            .map(|s| AccountFeatureRecord {
                account: id(s),
                features: AccountFeatures::default(),
                cbi_raw: 0.0,
                cbi: 0.0,
                risk: None,
            })
            .collect();
        assert_eq!(table.len(), 2);
        assert!(table.contains("a"));
        let order: Vec<&str> = table.records().map(|r| r.account.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn amount_never_negative(v in 0.0f64..1.0e15) {
            let a = Amount::from_f64(v).unwrap();
            prop_assert!(a.as_f64() >= 0.0);
            prop_assert!((a.as_f64() - v).abs() <= v * 1e-12 + 1e-6);
        }

        #[test]
        fn tier_is_total(p in 0.0f64..=1.0) {
            let tier = RiskTier::from_probability(p);
            let expected = if p > 0.7 {
                RiskTier::High
            } else if p > 0.4 {
                RiskTier::Medium
            } else {
                RiskTier::Low
            };
            prop_assert_eq!(tier, expected);
        }
    }
}
