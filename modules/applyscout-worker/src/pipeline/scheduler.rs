use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;

use applyscout_common::Config;

use crate::pipeline::{run_apply_pass, run_discovery};
use crate::runner::ApplyRunner;
use crate::search::SearchProvider;
use crate::store::JobStore;

/// Long-running worker loop: discovery and apply passes on independent
/// periods. Both tick immediately on startup. A failing pass is logged
/// and the loop keeps going; only shutdown signals end it.
pub async fn run_scheduler(
    store: Arc<dyn JobStore>,
    searcher: Arc<dyn SearchProvider>,
    runner: Arc<ApplyRunner>,
    config: &Config,
) -> Result<()> {
    let mut discover_tick =
        tokio::time::interval(Duration::from_secs(config.discover_interval_secs.max(1)));
    let mut apply_tick =
        tokio::time::interval(Duration::from_secs(config.apply_interval_secs.max(1)));
    discover_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    apply_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        discover_interval_secs = config.discover_interval_secs,
        apply_interval_secs = config.apply_interval_secs,
        "Scheduler started"
    );

    loop {
        tokio::select! {
            _ = discover_tick.tick() => {
                if let Err(error) = run_discovery(store.as_ref(), searcher.as_ref(), config).await {
                    tracing::error!(error = %error, "Discovery run failed");
                }
            }
            _ = apply_tick.tick() => {
                if let Err(error) = run_apply_pass(store.as_ref(), runner.as_ref(), config.batch_size).await {
                    tracing::error!(error = %error, "Apply pass failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping scheduler");
                return Ok(());
            }
        }
    }
}
