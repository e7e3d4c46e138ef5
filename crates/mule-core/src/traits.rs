//! Trait interfaces for mulegraph.
//!
//! - [`ProbabilityOracle`] — trained fraud classifier (external; mule-score
//!   ships a logistic implementation)

use crate::constants::FEATURE_COUNT;
use crate::error::OracleError;
use crate::types::FeatureVector;

/// Trained binary classifier returning the probability that an account is fraudulent.
///
/// Trained out-of-band; the label for an account is 1 if any of its outgoing
/// transactions is marked fraud, 0 otherwise. Timeouts and cancellation are
/// the implementation's responsibility and must surface as [`OracleError`]
/// rather than blocking forever.
pub trait ProbabilityOracle: Send + Sync {
    /// Number of features the oracle was trained on.
    ///
    /// Default: the six features of [`FeatureVector`].
    fn arity(&self) -> usize {
        FEATURE_COUNT
    }

    /// Fraud probability in `[0, 1]` for one account's feature vector.
    fn probability(&self, features: &FeatureVector) -> Result<f64, OracleError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "oracle"
    }
}
