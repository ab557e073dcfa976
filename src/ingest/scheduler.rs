// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::harvest::{HarvestMode, Harvester};

#[derive(Clone, Copy, Debug)]
pub struct HarvestSchedulerCfg {
    pub interval: Duration,
    /// Run one full harvest before the first incremental tick.
    pub full_on_start: bool,
}

/// Incremental harvests every `interval` until `cancel` fires. A failed run
/// is logged; the next tick tries again.
pub fn spawn_harvest_scheduler(
    harvester: Arc<Harvester>,
    cfg: HarvestSchedulerCfg,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if cfg.full_on_start {
            tick(&harvester, HarvestMode::Full, &cancel).await;
        }

        let mut ticker = tokio::time::interval(cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if cfg.full_on_start {
            // the immediate first tick would repeat the startup pass
            ticker.tick().await;
        }
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(target: "harvest", "scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    tick(&harvester, HarvestMode::Incremental, &cancel).await;
                }
            }
        }
    })
}

async fn tick(harvester: &Harvester, mode: HarvestMode, cancel: &CancellationToken) {
    match harvester.run(mode, cancel).await {
        Ok(report) => tracing::info!(
            target: "harvest",
            mode = mode.as_str(),
            articles = report.articles_written,
            sources_failed = report.sources_failed,
            "scheduled harvest tick"
        ),
        Err(e) => tracing::warn!(target: "harvest", error = %e, "scheduled harvest failed"),
    }
}
