//! News aggregator binary entrypoint.
//! Loads config, provisions the search store, starts the harvest scheduler
//! and serves the search API.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_aggregator::ingest::scheduler::{spawn_harvest_scheduler, HarvestSchedulerCfg};
use news_aggregator::ingest::HttpFeedFetcher;
use news_aggregator::metrics::Metrics;
use news_aggregator::registry::{SourceRegistry, StaticRegistry};
use news_aggregator::store::mapping::{provision, seed_publishers};
use news_aggregator::store::{DocumentStore, ElasticStore};
use news_aggregator::{router, AppConfig, Services};

/// Compact logs by default, JSON lines with `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_aggregator=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    // Shuttle may already have installed a subscriber.
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default()?;
    let metrics = Metrics::init(cfg.harvest.batch_size)?;

    let sources = StaticRegistry::from_path(&cfg.registry.path)
        .with_context(|| format!("loading sources from {}", cfg.registry.path.display()))?;
    if sources.is_empty() {
        tracing::warn!(path = %cfg.registry.path.display(), "no sources registered");
    } else {
        tracing::info!(sources = sources.len(), "source registry loaded");
    }
    let registry: Arc<dyn SourceRegistry> = Arc::new(sources);
    let store: Arc<dyn DocumentStore> =
        Arc::new(ElasticStore::new(&cfg.store).context("building store client")?);
    let fetcher = Arc::new(HttpFeedFetcher::new().context("building feed client")?);

    let plan = cfg.startup_plan();
    if plan.provision {
        if plan.wipe {
            tracing::warn!("wiping and recreating search indices");
        }
        provision(store.as_ref(), plan.wipe)
            .await
            .context("provisioning indices")?;
        match seed_publishers(store.as_ref(), registry.as_ref(), cfg.harvest.batch_size).await {
            Ok(n) => tracing::info!(publishers = n, "publisher hints seeded"),
            Err(e) => tracing::warn!(error = %e, "publisher hints not seeded"),
        }
    }

    let services = Services::new(&cfg, registry, fetcher, store);
    let shutdown = CancellationToken::new();

    if cfg.harvest.enabled {
        spawn_harvest_scheduler(
            Arc::clone(&services.harvester),
            HarvestSchedulerCfg {
                interval: cfg.harvest.interval(),
                full_on_start: plan.full_harvest,
            },
            shutdown.child_token(),
        );
    }

    let app = router(services.app_state(shutdown)).merge(metrics.router());
    Ok(app.into())
}
