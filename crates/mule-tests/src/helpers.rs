//! Shared builders and oracles for integration tests.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use mule_core::constants::FEATURE_COUNT;
use mule_core::error::OracleError;
use mule_core::traits::ProbabilityOracle;
use mule_core::types::{AccountId, Amount, FeatureVector, Transaction};
use mule_pipeline::Pipeline;

/// Header of the transaction CSV export.
pub const CSV_HEADER: &str =
    "typeofaction,sourceid,destinationid,amountofmoney,date,isfraud,typeoffraud";

/// Fixed timestamp, 2020-01-05 13:04:00.
pub fn ts() -> NaiveDateTime {
    ts_day(5)
}

/// 13:04:00 on the given day of January 2020.
pub fn ts_day(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, day)
        .unwrap()
        .and_hms_opt(13, 4, 0)
        .unwrap()
}

/// Non-fraudulent transfer at [`ts`].
pub fn tx(src: &str, dst: &str, amount: f64) -> Transaction {
    Transaction::new(
        AccountId::new(src).unwrap(),
        AccountId::new(dst).unwrap(),
        Amount::from_f64(amount).unwrap(),
        ts(),
    )
}

/// Fraud-labelled transfer at [`ts`].
pub fn fraud_tx(src: &str, dst: &str, amount: f64) -> Transaction {
    tx(src, dst, amount).with_fraud(Some("cash-out".into()))
}

/// Account A ("100") sends three transfers totalling 300 to two receivers,
/// two of them to B ("200").
pub fn a_b_batch() -> Vec<Transaction> {
    vec![
        tx("100", "200", 100.0),
        tx("100", "200", 120.0),
        tx("100", "300", 80.0),
    ]
}

/// Deterministic batch of `n` transfers among `accounts` numeric accounts.
pub fn synthetic_batch(n: usize, accounts: usize) -> Vec<Transaction> {
    (0..n)
        .map(|i| {
            let src = (i * 7919) % accounts;
            let dst = (i * 104_729 + 1) % accounts;
            let amount = ((i * 37) % 5000) as f64 + 0.5;
            tx(&src.to_string(), &dst.to_string(), amount)
        })
        .collect()
}

/// Returns the CBI feature as the fraud probability.
pub struct CbiOracle;

impl ProbabilityOracle for CbiOracle {
    fn probability(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        Ok(features.as_slice()[FEATURE_COUNT - 1])
    }

    fn name(&self) -> &str {
        "cbi"
    }
}

/// Same probability for every account.
pub struct FixedOracle(pub f64);

impl ProbabilityOracle for FixedOracle {
    fn probability(&self, _features: &FeatureVector) -> Result<f64, OracleError> {
        Ok(self.0)
    }
}

/// Times out for accounts that sent more than `max_sent` transactions.
pub struct TimeoutOracle {
    pub max_sent: u64,
}

impl ProbabilityOracle for TimeoutOracle {
    fn probability(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        if features.as_slice()[0] > self.max_sent as f64 {
            Err(OracleError::Timeout)
        } else {
            Ok(0.2)
        }
    }
}

/// Pipeline with default config over `oracle`.
pub fn pipeline_with(oracle: impl ProbabilityOracle + 'static) -> Pipeline {
    Pipeline::builder()
        .oracle(Arc::new(oracle))
        .build()
        .unwrap()
}

/// CSV text for `rows` of `(action, src, dst, amount, date, isfraud, fraud_type)`.
pub fn csv_text(rows: &[(&str, &str, &str, &str, &str, &str, &str)]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for (action, src, dst, amount, date, fraud, kind) in rows {
        out.push_str(&format!("{action},{src},{dst},{amount},{date},{fraud},{kind}\n"));
    }
    out
}
