//! # mule-pipeline
//! End-to-end scoring pipeline: stored snapshot, what-if evaluation,
//! configuration and the CSV ingestion adapter.

pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod whatif;

pub use config::PipelineConfig;
pub use ingest::{read_transactions, read_transactions_path, IngestedBatch, IngestionError};
pub use pipeline::{Pipeline, PipelineBuilder, Snapshot};
pub use whatif::{HypotheticalTransfer, WhatIfEvaluator, WhatIfOutcome};
