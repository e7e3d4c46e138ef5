//! Error types for the mulegraph pipeline.
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    #[error("negative amount")] Negative,
    #[error("non-finite amount")] NonFinite,
    #[error("amount exceeds maximum")] TooLarge,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("blank account id")] Blank,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    #[error("blank account id")] Blank,
    #[error("not numeric: {0}")] NotNumeric(String),
    #[error("non-finite numeric id: {0}")] NonFinite(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureVectorError {
    #[error("non-finite feature {feature}")] NonFinite { feature: &'static str },
    #[error("arity mismatch: oracle expects {expected}, got {got}")] ArityMismatch { expected: usize, got: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle call timed out")] Timeout,
    #[error("oracle call cancelled")] Cancelled,
    #[error("oracle unavailable: {0}")] Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("invalid feature vector for {account}: {reason}")] InvalidFeatureVector { account: String, reason: FeatureVectorError },
    #[error("oracle failed for {account}: {source}")] Oracle { account: String, source: OracleError },
    #[error("probability {value} out of range for {account}")] ProbabilityOutOfRange { account: String, value: f64 },
}

impl ClassificationError {
    /// Account the failure belongs to.
    pub fn account(&self) -> &str {
        match self {
            Self::InvalidFeatureVector { account, .. }
            | Self::Oracle { account, .. }
            | Self::ProbabilityOutOfRange { account, .. } => account,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WhatIfError {
    #[error("account not found: {0}")] AccountNotFound(String),
    #[error("invalid transfer: {0}")] InvalidTransfer(String),
    #[error(transparent)] Classification(#[from] ClassificationError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no probability oracle bound")] ClassifierUnavailable,
    #[error("worker pool: {0}")] ThreadPool(String),
    #[error("config: {0}")] Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_error_reports_account() {
        let err = ClassificationError::Oracle {
            account: "42".into(),
            source: OracleError::Timeout,
        };
        assert_eq!(err.account(), "42");
        assert_eq!(err.to_string(), "oracle failed for 42: oracle call timed out");
    }

    #[test]
    fn what_if_wraps_classification() {
        let inner = ClassificationError::ProbabilityOutOfRange {
            account: "7".into(),
            value: 1.5,
        };
        let err: WhatIfError = inner.clone().into();
        assert_eq!(err, WhatIfError::Classification(inner));
    }
}
