use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use applyscout_common::Config;
use applyscout_worker::adapter::{ApplyAdapter, StubAdapter};
use applyscout_worker::pipeline::{run_apply_pass, run_discovery, run_scheduler};
use applyscout_worker::runner::ApplyRunner;
use applyscout_worker::search::SearchProvider;
use applyscout_worker::store::MemoryStore;
use applyscout_worker::yutori::{YutoriApplyAdapter, YutoriOptions};
use tavily_client::TavilyClient;
use yutori_client::YutoriClient;

#[derive(Parser)]
#[command(name = "applyscout-worker", about = "Job discovery and application worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one discovery pass: search, rank, and enqueue apply tasks.
    Discover,
    /// Run one apply pass over queued tasks.
    Apply,
    /// Run both loops continuously on their configured intervals.
    Run,
}

fn build_searcher(config: &Config) -> Result<Arc<dyn SearchProvider>> {
    match &config.tavily_api_key {
        Some(key) => Ok(Arc::new(TavilyClient::new(key))),
        None => bail!("TAVILY_API_KEY is required for discovery"),
    }
}

fn build_adapter(config: &Config) -> Arc<dyn ApplyAdapter> {
    match &config.yutori_api_key {
        Some(key) => {
            tracing::info!("Using Yutori browser adapter");
            Arc::new(YutoriApplyAdapter::new(
                YutoriClient::new(key),
                YutoriOptions::default(),
            ))
        }
        None => {
            tracing::warn!("YUTORI_API_KEY not set, using stub adapter (no real applications)");
            Arc::new(StubAdapter)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    config.log_redacted();

    // Single-process in-memory store; state lives for the process only.
    let store = Arc::new(MemoryStore::new());

    match cli.command {
        Command::Discover => {
            let searcher = build_searcher(&config)?;
            let stats = run_discovery(store.as_ref(), searcher.as_ref(), &config).await?;
            tracing::info!(?stats, "Discovery finished");
        }
        Command::Apply => {
            let runner = ApplyRunner::new(build_adapter(&config), config.runner.clone());
            let stats = run_apply_pass(store.as_ref(), &runner, config.batch_size).await?;
            tracing::info!(?stats, "Apply pass finished");
        }
        Command::Run => {
            let searcher = build_searcher(&config)?;
            let runner = Arc::new(ApplyRunner::new(build_adapter(&config), config.runner.clone()));
            run_scheduler(store, searcher, runner, &config).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        tracing::error!(error = %error, "Worker failed");
        std::process::exit(1);
    }
}
