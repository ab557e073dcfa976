// src/lib.rs
// Public library surface for integration tests and the binary.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod registry;
pub mod search;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::ingest::{HarvestMode, HarvestReport, Harvester};
pub use crate::search::{HintService, SearchResult, SearchService};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::ingest::{harvest::HarvestSettings, FeedFetcher};
use crate::registry::SourceRegistry;
use crate::store::DocumentStore;

/// Explicitly constructed services shared by the HTTP layer and the scheduler.
pub struct Services {
    pub harvester: Arc<Harvester>,
    pub search: SearchService,
    pub hints: HintService,
}

impl Services {
    pub fn new(
        cfg: &AppConfig,
        registry: Arc<dyn SourceRegistry>,
        fetcher: Arc<dyn FeedFetcher>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let harvester = Harvester::new(
            registry,
            fetcher,
            Arc::clone(&store),
            HarvestSettings::from(&cfg.harvest),
        );
        Self {
            harvester: Arc::new(harvester),
            search: SearchService::new(Arc::clone(&store), cfg.search.max_page_size),
            hints: HintService::new(store),
        }
    }

    pub fn app_state(&self, shutdown: CancellationToken) -> AppState {
        AppState {
            search: self.search.clone(),
            hints: self.hints.clone(),
            harvester: Arc::clone(&self.harvester),
            shutdown,
        }
    }
}
