//! # mule-score — Behavioral features, composite index and risk tiers.
//!
//! Pipeline stages, each a pure function over its inputs:
//! - [`FeatureAggregator`]: per-account sender/receiver statistics, computed
//!   as a parallel fold over an associative accumulator.
//! - [`CompositeIndexScorer`]: weighted composite behavioral index (CBI),
//!   min-max normalized over the whole batch.
//! - [`RiskClassifier`]: probability oracle output mapped to Low / Medium / High,
//!   with per-account partial failures.
//! - [`training`]: labels and examples for training an oracle out-of-band.

pub mod aggregate;
pub mod cbi;
pub mod classifier;
pub mod oracle;
pub mod training;

pub use aggregate::{AccountAccumulator, AggregatedFeatures, FeatureAggregator};
pub use cbi::{normalize, CbiRange, CompositeIndexScorer};
pub use classifier::{ClassificationReport, RiskClassifier};
pub use oracle::{LogisticOracle, ModelError};
pub use training::{training_examples, training_labels, TrainingExample};
