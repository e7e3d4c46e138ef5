//! Pipeline composition and the stored snapshot.
//!
//! A [`Pipeline`] runs aggregate → score → classify → build-graph over a batch.
//! [`Pipeline::refresh`] stores the result as an immutable [`Snapshot`] behind
//! a read/write lock. Readers clone the `Arc` and never block a refresh for
//! longer than the pointer swap. What-if queries read the stored batch and
//! never take the write lock.

use std::sync::Arc;

use chrono::NaiveDateTime;
use mule_core::error::{ClassificationError, PipelineError, WhatIfError};
use mule_core::traits::ProbabilityOracle;
use mule_core::types::{FeatureTable, Transaction};
use mule_graph::{GraphDiagnostics, TransactionGraph, TransactionGraphBuilder};
use mule_score::{CompositeIndexScorer, FeatureAggregator, RiskClassifier};
use parking_lot::RwLock;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::info;

use crate::config::PipelineConfig;
use crate::whatif::{HypotheticalTransfer, WhatIfEvaluator, WhatIfOutcome};

/// Result of one full pipeline pass.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// The batch the rest of the snapshot was computed from.
    pub batch: Vec<Transaction>,
    pub table: FeatureTable,
    /// Accounts excluded from classification.
    pub failures: Vec<ClassificationError>,
    pub graph: TransactionGraph,
    pub diagnostics: GraphDiagnostics,
}

/// Collects the oracle and configuration for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    oracle: Option<Arc<dyn ProbabilityOracle>>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oracle(mut self, oracle: Arc<dyn ProbabilityOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails with [`PipelineError::ClassifierUnavailable`] if no oracle was set.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let oracle = self.oracle.ok_or(PipelineError::ClassifierUnavailable)?;
        self.config.validate()?;

        let pool = self
            .config
            .worker_threads
            .map(|n| {
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("mulegraph-worker-{i}"))
                    .build()
                    .map_err(|e| PipelineError::ThreadPool(e.to_string()))
            })
            .transpose()?;

        let scorer = CompositeIndexScorer::new(self.config.cbi_weights);
        let classifier = RiskClassifier::new(oracle).with_thresholds(self.config.thresholds);
        info!(
            oracle = classifier.oracle_name(),
            worker_threads = ?self.config.worker_threads,
            "pipeline ready"
        );

        Ok(Pipeline {
            aggregator: FeatureAggregator::new(),
            scorer,
            evaluator: WhatIfEvaluator::new(scorer, classifier.clone()),
            classifier,
            graph_builder: TransactionGraphBuilder::new(),
            pool,
            config: self.config,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        })
    }
}

pub struct Pipeline {
    aggregator: FeatureAggregator,
    scorer: CompositeIndexScorer,
    classifier: RiskClassifier,
    evaluator: WhatIfEvaluator,
    graph_builder: TransactionGraphBuilder,
    pool: Option<ThreadPool>,
    config: PipelineConfig,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `batch` without touching the stored snapshot.
    pub fn run(&self, batch: &[Transaction]) -> Snapshot {
        self.compute(batch.to_vec())
    }

    /// Run the pipeline and replace the stored snapshot.
    pub fn refresh(&self, batch: Vec<Transaction>) -> Arc<Snapshot> {
        let snapshot = Arc::new(self.compute(batch));
        *self.snapshot.write() = Arc::clone(&snapshot);
        info!(
            transactions = snapshot.batch.len(),
            accounts = snapshot.table.len(),
            failures = snapshot.failures.len(),
            nodes = snapshot.graph.node_count(),
            edges = snapshot.graph.edge_count(),
            "snapshot refreshed"
        );
        snapshot
    }

    fn compute(&self, batch: Vec<Transaction>) -> Snapshot {
        self.install(|| {
            let features = self.aggregator.aggregate(&batch);
            // Scoring needs the whole population before any CBI can be normalized.
            let table = self.scorer.score(features);
            let report = self.classifier.classify_table(table);
            let (graph, diagnostics) = self.graph_builder.build(&report.table, &batch);
            Snapshot {
                batch,
                table: report.table,
                failures: report.failures,
                graph,
                diagnostics,
            }
        })
    }

    /// The most recently stored snapshot. Empty before the first refresh.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Evaluate a hypothetical transfer against the stored batch, stamped now.
    pub fn what_if(&self, transfer: &HypotheticalTransfer) -> Result<WhatIfOutcome, WhatIfError> {
        let snapshot = self.snapshot();
        self.install(|| self.evaluator.evaluate(&snapshot.batch, transfer))
    }

    /// Evaluate a hypothetical transfer against the stored batch at `timestamp`.
    pub fn what_if_at(
        &self,
        transfer: &HypotheticalTransfer,
        timestamp: NaiveDateTime,
    ) -> Result<WhatIfOutcome, WhatIfError> {
        let snapshot = self.snapshot();
        self.install(|| self.evaluator.evaluate_at(&snapshot.batch, transfer, timestamp))
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}
