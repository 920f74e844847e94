//! Batch feature computation.
//!
//! Loads the impression history once, computes features for every request in
//! a request file and writes one JSON record per request to stdout, in input
//! order. Failed requests produce an error record at their own index.

use anyhow::{Context, Result};
use clap::Parser;
use reach_core::{Config, FeatureVector};
use reach_features::{FeatureAssembler, HistoryStore};
use reach_ingestion::{HistoryReader, RequestReader};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reach-features")]
#[command(about = "Compute reach features for impression requests", long_about = None)]
struct Cli {
    /// History table (header with hour, cpm, publisher, user_id)
    #[arg(long, env = "REACH_HISTORY")]
    history: PathBuf,

    /// Requests as a delimited table, or JSON lines when ending in .json/.jsonl
    #[arg(long)]
    requests: PathBuf,

    /// JSON configuration file
    #[arg(short = 'c', long, env = "REACH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the session gap threshold (hours)
    #[arg(long)]
    gap_threshold: Option<i64>,

    /// Emit features as an ordered numeric row instead of named fields
    #[arg(long)]
    model_input: bool,
}

/// One output line.
#[derive(Debug, Serialize)]
struct Record {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    features: Option<FeatureVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    row: Option<[f64; 8]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Record {
    fn new(index: usize, result: reach_core::Result<FeatureVector>, model_input: bool) -> Self {
        match result {
            Ok(fv) if model_input => Self {
                index,
                features: None,
                row: Some(fv.to_model_input()),
                error: None,
            },
            Ok(fv) => Self {
                index,
                features: Some(fv),
                row: None,
                error: None,
            },
            Err(e) => Self {
                index,
                features: None,
                row: None,
                error: Some(e.to_string()),
            },
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(gap) = cli.gap_threshold {
        config.session.gap_threshold = gap;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let events = HistoryReader::from_config(&config.input)
        .read_path(&cli.history)
        .with_context(|| format!("failed to load history from {}", cli.history.display()))?;
    let history = Arc::new(HistoryStore::new(events));
    info!(
        events = history.len(),
        users = history.user_count(),
        hours = ?history.hour_range(),
        "history indexed"
    );
    let assembler = FeatureAssembler::new(history, &config);

    let requests = RequestReader::from_config(&config.input)
        .read_path(&cli.requests)
        .with_context(|| format!("failed to load requests from {}", cli.requests.display()))?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut failed = 0usize;
    let total = requests.len();
    for (index, result) in assembler.compute_rows(requests).into_iter().enumerate() {
        failed += usize::from(result.is_err());
        serde_json::to_writer(&mut out, &Record::new(index, result, cli.model_input))?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(total, failed, "features written");
    Ok(())
}
