//! hbc-train - fit the heartbeat classifier from labeled manifests
//!
//! ```bash
//! hbc-train [--config hbc.toml] [--dataset-dir DIR] [--manifest set_a.csv]... [--model FILE]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hbc_common::config::TomlConfig;
use hbc_train::pipeline::{self, TrainingPlan};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for hbc-train
#[derive(Parser, Debug)]
#[command(name = "hbc-train")]
#[command(about = "Train the heartbeat sound classifier")]
#[command(version)]
struct Args {
    /// TOML configuration file (default: ./hbc.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory that manifest file names are relative to
    #[arg(long, value_name = "DIR")]
    dataset_dir: Option<PathBuf>,

    /// Manifest CSV, relative to the dataset directory (repeatable)
    #[arg(long = "manifest", value_name = "CSV")]
    manifests: Vec<PathBuf>,

    /// Output model file
    #[arg(short, long, value_name = "FILE")]
    model: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let loaded = TomlConfig::resolve(args.config.as_deref(), &cwd)
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| loaded.config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hbc-train v{}", env!("CARGO_PKG_VERSION"));
    loaded.log_source();

    let mut config = loaded.config;
    if let Some(dataset_dir) = args.dataset_dir {
        config.training.dataset_dir = dataset_dir;
    }
    if !args.manifests.is_empty() {
        config.training.manifests = args.manifests;
    }
    if let Some(model) = args.model {
        config.model_path = model;
    }

    let plan = TrainingPlan::from_config(&config);
    let outcome = pipeline::run(&plan).context("Training failed")?;

    for summary in &outcome.manifests {
        info!(
            "{}: {} rows, {} used, {} skipped",
            summary.path.display(),
            summary.rows,
            summary.accepted,
            summary.skipped
        );
    }

    println!("{}", outcome.report);
    info!(
        samples = outcome.samples_used,
        skipped = outcome.skipped.len(),
        "Model written to {}",
        outcome.model_path.display()
    );
    Ok(())
}
