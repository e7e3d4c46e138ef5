//! mule-cli — score a transaction export, export the annotated graph, or
//! evaluate a hypothetical transfer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mule_core::error::WhatIfError;
use mule_core::types::RiskTier;
use mule_graph::present::{edge_title, node_title, risk_color};
use mule_graph::GraphDiagnostics;
use mule_pipeline::{read_transactions_path, HypotheticalTransfer, Pipeline, PipelineConfig};
use mule_score::{training_examples, LogisticOracle};
use serde::Serialize;
use tracing::info;

/// Mule-account risk scoring over transaction batches.
#[derive(Parser, Debug)]
#[command(name = "mule-cli", version, about = "Mule-account risk scoring")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every account in a transaction export.
    Score(ScoreArgs),
    /// Write the annotated transaction graph as JSON.
    Graph(GraphArgs),
    /// Evaluate a hypothetical transfer against the export.
    WhatIf(WhatIfArgs),
    /// Write labelled feature rows for model training as JSON.
    TrainingSet(TrainingSetArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Transaction CSV export
    #[arg(short, long)]
    input: PathBuf,

    /// Logistic model file (JSON)
    #[arg(short, long)]
    model: PathBuf,

    /// Optional pipeline config (TOML); MULEGRAPH__* env vars override it
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Emit the feature table as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct GraphArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Destination file for the graph JSON
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct WhatIfArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Sending account id
    #[arg(long)]
    source: String,

    /// Receiving account id
    #[arg(long)]
    destination: String,

    /// Transfer amount
    #[arg(long)]
    amount: f64,
}

#[derive(Args, Debug)]
struct TrainingSetArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Destination file for the training rows
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Serialize)]
struct ExportNode<'a> {
    id: &'a str,
    cbi: f64,
    risk: Option<RiskTier>,
    fraud_probability: Option<f64>,
    color: &'static str,
    title: String,
}

#[derive(Serialize)]
struct ExportEdge<'a> {
    source: &'a str,
    destination: &'a str,
    amount: f64,
    date: &'a str,
    fraud: u8,
    title: String,
}

#[derive(Serialize)]
struct GraphExport<'a> {
    nodes: Vec<ExportNode<'a>>,
    edges: Vec<ExportEdge<'a>>,
    diagnostics: &'a GraphDiagnostics,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Score(args) => score(args),
        Commands::Graph(args) => graph(args),
        Commands::WhatIf(args) => what_if(args),
        Commands::TrainingSet(args) => training_set(args),
    }
}

/// Load config, model and batch, then build a pipeline over the batch.
fn load(input: &InputArgs) -> Result<Pipeline> {
    let config = PipelineConfig::load(input.config.as_deref()).context("Failed to load config")?;
    let oracle = LogisticOracle::from_path(&input.model)
        .with_context(|| format!("Failed to load model: {}", input.model.display()))?;
    let pipeline = Pipeline::builder()
        .oracle(Arc::new(oracle))
        .config(config)
        .build()
        .context("Failed to start pipeline")?;

    let batch = read_transactions_path(&input.input)
        .with_context(|| format!("Failed to read transactions: {}", input.input.display()))?;
    info!(
        input = %input.input.display(),
        transactions = batch.transactions.len(),
        "loaded batch"
    );
    pipeline.refresh(batch.transactions);
    Ok(pipeline)
}

fn score(args: ScoreArgs) -> Result<()> {
    let pipeline = load(&args.input)?;
    let snapshot = pipeline.snapshot();

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot.table)
            .context("Failed to serialize feature table")?;
        println!("{json}");
    } else {
        println!(
            "{:<16} {:>6} {:>16} {:>6} {:>8} {:>7} {:>7}",
            "ACCOUNT", "TX", "TOTAL SENT", "RX", "CBI", "PROB", "RISK"
        );
        for r in snapshot.table.records() {
            let prob = r
                .fraud_probability()
                .map_or_else(|| "-".to_string(), |p| format!("{p:.3}"));
            let tier = r.risk_tier().map_or("-", |t| t.as_str());
            println!(
                "{:<16} {:>6} {:>16.2} {:>6} {:>8.3} {:>7} {:>7}",
                r.account.as_str(),
                r.features.tx_count,
                r.features.total_sent,
                r.features.rx_count,
                r.cbi,
                prob,
                tier
            );
        }
    }

    if !snapshot.failures.is_empty() {
        eprintln!("\n{} account(s) not classified:", snapshot.failures.len());
        for failure in &snapshot.failures {
            eprintln!("  {failure}");
        }
    }
    Ok(())
}

fn graph(args: GraphArgs) -> Result<()> {
    let pipeline = load(&args.input)?;
    let snapshot = pipeline.snapshot();
    let g = &snapshot.graph;

    let export = GraphExport {
        nodes: g
            .nodes()
            .map(|n| ExportNode {
                id: n.id,
                cbi: n.cbi,
                risk: n.risk_tier,
                fraud_probability: n.fraud_probability,
                color: risk_color(n.risk_tier),
                title: node_title(&n),
            })
            .collect(),
        edges: g
            .edges()
            .map(|e| ExportEdge {
                source: e.source,
                destination: e.destination,
                amount: e.amount,
                date: e.timestamp,
                fraud: u8::from(e.fraud_label),
                title: edge_title(&e),
            })
            .collect(),
        diagnostics: &snapshot.diagnostics,
    };
    write_json(&args.output, &export)?;

    println!(
        "Wrote {} nodes and {} edges to {}",
        g.node_count(),
        g.edge_count(),
        args.output.display()
    );
    if !snapshot.diagnostics.is_clean() {
        eprintln!(
            "Omitted {} account(s), merged {}, rejected {} transaction(s)",
            snapshot.diagnostics.uncanonical_accounts.len(),
            snapshot.diagnostics.merged_accounts.len(),
            snapshot.diagnostics.rejected_edges.len()
        );
    }
    Ok(())
}

fn what_if(args: WhatIfArgs) -> Result<()> {
    let pipeline = load(&args.input)?;
    let transfer = HypotheticalTransfer::new(args.source, args.destination, args.amount);

    match pipeline.what_if(&transfer) {
        Ok(outcome) => {
            println!("Account:           {}", outcome.record.account);
            println!("Fraud probability: {:.3}", outcome.risk.fraud_probability);
            println!("Risk:              {}", outcome.risk.tier);
            Ok(())
        }
        Err(WhatIfError::AccountNotFound(_)) => {
            println!("account not found");
            Ok(())
        }
        Err(e) => bail!("What-if evaluation failed: {e}"),
    }
}

fn training_set(args: TrainingSetArgs) -> Result<()> {
    let pipeline = load(&args.input)?;
    let snapshot = pipeline.snapshot();
    let rows = training_examples(&snapshot.table, &snapshot.batch);
    write_json(&args.output, &rows)?;
    println!("Wrote {} training rows to {}", rows.len(), args.output.display());
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Logs go to stderr so stdout stays clean for table and JSON output.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
