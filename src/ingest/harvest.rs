// src/ingest/harvest.rs
//! Batched scatter/gather over all registered sources.
//!
//! Batches run strictly in sequence. Inside a batch every source is its own
//! task, and inside a source every feed item is its own task; each level
//! waits for all of its tasks before moving on. Only registry failures end a
//! run early; fetch, parse and write failures are logged and counted.

use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ensure_metrics_described;
use super::ner::count_potential_names;
use super::transform::{
    article_from_item, categories_from_item, people_from_item, FreshnessPolicy, Skip,
};
use super::types::{FeedFetcher, FeedItem};
use crate::config::HarvestConfig;
use crate::domain::{Publisher, Source};
use crate::error::{FetchError, HarvestError, StoreError};
use crate::registry::SourceRegistry;
use crate::store::{DocumentStore, IndexOutcome};

pub use super::transform::HarvestMode;

#[derive(Debug, Clone, Copy)]
pub struct HarvestSettings {
    pub batch_size: u64,
    pub fresh_window: Duration,
    pub fetch_timeout: Duration,
    pub store_timeout: Duration,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self::from(&HarvestConfig::default())
    }
}

impl From<&HarvestConfig> for HarvestSettings {
    fn from(cfg: &HarvestConfig) -> Self {
        Self {
            batch_size: cfg.batch_size.max(1),
            fresh_window: cfg.fresh_window(),
            fetch_timeout: cfg.fetch_timeout(),
            store_timeout: cfg.store_timeout(),
        }
    }
}

/// Outcome of a run that was not aborted by the registry.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub mode: HarvestMode,
    pub batches_planned: usize,
    pub batches: usize,
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub items_seen: usize,
    pub items_indexed: usize,
    pub items_skipped_stale: usize,
    pub items_skipped_undated: usize,
    pub articles_written: usize,
    pub categories_written: usize,
    pub people_written: usize,
    pub index_failures: usize,
    pub potential_names: usize,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl HarvestReport {
    fn new(mode: HarvestMode) -> Self {
        Self {
            mode,
            batches_planned: 0,
            batches: 0,
            sources_ok: 0,
            sources_failed: 0,
            items_seen: 0,
            items_indexed: 0,
            items_skipped_stale: 0,
            items_skipped_undated: 0,
            articles_written: 0,
            categories_written: 0,
            people_written: 0,
            index_failures: 0,
            potential_names: 0,
            cancelled: false,
            elapsed_ms: 0,
        }
    }

    fn absorb(&mut self, s: SourceTally) {
        self.sources_ok += 1;
        self.items_seen += s.items_seen;
        self.items_indexed += s.items_indexed;
        self.items_skipped_stale += s.skipped_stale;
        self.items_skipped_undated += s.skipped_undated;
        self.articles_written += s.writes.articles;
        self.categories_written += s.writes.categories;
        self.people_written += s.writes.people;
        self.index_failures += s.writes.failures;
        self.potential_names += s.potential_names;
        self.cancelled |= s.cancelled;
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct WriteTally {
    articles: usize,
    categories: usize,
    people: usize,
    failures: usize,
}

#[derive(Debug, Default)]
struct SourceTally {
    items_seen: usize,
    items_indexed: usize,
    skipped_stale: usize,
    skipped_undated: usize,
    writes: WriteTally,
    potential_names: usize,
    cancelled: bool,
}

enum ItemOutcome {
    Skipped(Skip),
    Indexed(WriteTally),
}

/// Everything a source or item task needs; cheap to clone into `'static` tasks.
#[derive(Clone)]
struct Workers {
    fetcher: Arc<dyn FeedFetcher>,
    store: Arc<dyn DocumentStore>,
    fetch_timeout: Duration,
    store_timeout: Duration,
    policy: FreshnessPolicy,
    cancel: CancellationToken,
}

pub struct Harvester {
    registry: Arc<dyn SourceRegistry>,
    fetcher: Arc<dyn FeedFetcher>,
    store: Arc<dyn DocumentStore>,
    settings: HarvestSettings,
}

impl Harvester {
    pub fn new(
        registry: Arc<dyn SourceRegistry>,
        fetcher: Arc<dyn FeedFetcher>,
        store: Arc<dyn DocumentStore>,
        settings: HarvestSettings,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
            settings,
        }
    }

    /// One pass over every source. The duration histogram is observed exactly
    /// once, whether or not the run succeeds.
    pub async fn run(
        &self,
        mode: HarvestMode,
        cancel: &CancellationToken,
    ) -> Result<HarvestReport, HarvestError> {
        ensure_metrics_described();
        counter!("harvest_runs_total", "mode" => mode.as_str()).increment(1);
        let started = Instant::now();

        let result = self.run_batches(mode, cancel).await;

        let elapsed = started.elapsed();
        histogram!("harvest_duration_seconds").record(elapsed.as_secs_f64());

        match result {
            Ok(mut report) => {
                report.elapsed_ms = elapsed.as_millis() as u64;
                info!(
                    target: "harvest",
                    mode = mode.as_str(),
                    batches = report.batches,
                    sources_ok = report.sources_ok,
                    sources_failed = report.sources_failed,
                    articles = report.articles_written,
                    skipped_stale = report.items_skipped_stale,
                    skipped_undated = report.items_skipped_undated,
                    index_failures = report.index_failures,
                    cancelled = report.cancelled,
                    elapsed_ms = report.elapsed_ms,
                    "harvest finished"
                );
                info!(target: "harvest", count = report.potential_names, "potential names/toponyms");
                Ok(report)
            }
            Err(e) => {
                warn!(target: "harvest", mode = mode.as_str(), error = %e, "harvest aborted");
                Err(e)
            }
        }
    }

    async fn run_batches(
        &self,
        mode: HarvestMode,
        cancel: &CancellationToken,
    ) -> Result<HarvestReport, HarvestError> {
        let batch_size = self.settings.batch_size.max(1);
        let total = self.registry.count().await.map_err(HarvestError::Count)?;
        let batches = total.div_ceil(batch_size) as usize;

        let mut report = HarvestReport::new(mode);
        report.batches_planned = batches;

        let workers = Workers {
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            fetch_timeout: self.settings.fetch_timeout,
            store_timeout: self.settings.store_timeout,
            policy: FreshnessPolicy::new(mode, self.settings.fresh_window, Utc::now()),
            cancel: cancel.clone(),
        };

        for batch in 0..batches {
            if cancel.is_cancelled() {
                report.cancelled = true;
                info!(target: "harvest", batch = batch + 1, batches, "cancelled before batch");
                break;
            }

            let offset = batch as u64 * batch_size;
            let sources = self
                .registry
                .find_batch_with_publisher(offset, batch_size)
                .await
                .map_err(|source| HarvestError::Batch {
                    batch: batch + 1,
                    batches,
                    source,
                })?;
            info!(
                target: "harvest",
                batch = batch + 1,
                batches,
                sources = sources.len(),
                "source batch read"
            );
            report.batches += 1;

            let mut set = JoinSet::new();
            for src in sources {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
                let w = workers.clone();
                set.spawn(async move {
                    let url = src.feed_url.clone();
                    harvest_source(w, src).await.map_err(|e| (url, e))
                });
            }

            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(Ok(tally)) => report.absorb(tally),
                    Ok(Err((url, e))) => {
                        warn!(target: "harvest", url = %url, error = %e, "source skipped");
                        counter!("harvest_sources_failed_total").increment(1);
                        report.sources_failed += 1;
                    }
                    Err(e) => {
                        warn!(target: "harvest", error = %e, "source task failed");
                        counter!("harvest_sources_failed_total").increment(1);
                        report.sources_failed += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}

async fn harvest_source(w: Workers, src: Source) -> Result<SourceTally, FetchError> {
    debug!(target: "harvest", source = %src.id, url = %src.feed_url, "fetching source");
    let items = match timeout(
        w.fetch_timeout,
        w.fetcher.fetch_feed(&src.feed_url, w.fetch_timeout),
    )
    .await
    {
        Ok(res) => res?,
        Err(_) => {
            return Err(FetchError::Timeout {
                url: src.feed_url.clone(),
                after: w.fetch_timeout,
            })
        }
    };

    let mut tally = SourceTally {
        items_seen: items.len(),
        potential_names: count_potential_names(&items),
        ..SourceTally::default()
    };

    let publisher = Arc::new(src.publisher);
    let mut set = JoinSet::new();
    for item in items {
        if w.cancel.is_cancelled() {
            tally.cancelled = true;
            break;
        }
        let w = w.clone();
        let publisher = Arc::clone(&publisher);
        set.spawn(async move { harvest_item(w, publisher, item).await });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(ItemOutcome::Indexed(writes)) => {
                tally.items_indexed += 1;
                tally.writes.articles += writes.articles;
                tally.writes.categories += writes.categories;
                tally.writes.people += writes.people;
                tally.writes.failures += writes.failures;
            }
            Ok(ItemOutcome::Skipped(Skip::Stale)) => tally.skipped_stale += 1,
            Ok(ItemOutcome::Skipped(Skip::Undated)) => tally.skipped_undated += 1,
            Err(e) => {
                warn!(target: "harvest", source = %src.id, error = %e, "item task failed");
                tally.writes.failures += 1;
            }
        }
    }

    Ok(tally)
}

async fn harvest_item(w: Workers, publisher: Arc<Publisher>, item: FeedItem) -> ItemOutcome {
    let published = match w.policy.check(&item) {
        Ok(p) => p,
        Err(skip) => {
            debug!(target: "harvest", reason = skip.as_str(), link = %item.link, "item skipped");
            counter!("harvest_items_skipped_total", "reason" => skip.as_str()).increment(1);
            return ItemOutcome::Skipped(skip);
        }
    };

    // Each write stands alone: a failed article does not stop its categories.
    let mut writes = WriteTally::default();
    let article = article_from_item(&publisher, &item, published);
    if w.write("article", &article.url, w.store.index_article(&article)).await {
        writes.articles += 1;
    } else {
        writes.failures += 1;
    }
    for category in categories_from_item(&item) {
        if w.write("category", &category.name, w.store.index_category(&category)).await {
            writes.categories += 1;
        } else {
            writes.failures += 1;
        }
    }
    for person in people_from_item(&item) {
        if w.write("person", &person.full_name, w.store.index_person(&person)).await {
            writes.people += 1;
        } else {
            writes.failures += 1;
        }
    }
    ItemOutcome::Indexed(writes)
}

impl Workers {
    async fn write<F>(&self, kind: &'static str, key: &str, fut: F) -> bool
    where
        F: Future<Output = Result<IndexOutcome, StoreError>>,
    {
        match timeout(self.store_timeout, fut).await {
            Ok(Ok(outcome)) => {
                debug!(target: "harvest", kind, key, created = outcome.is_created(), "document written");
                true
            }
            Ok(Err(e)) => {
                warn!(target: "harvest", kind, key, error = %e, "document write failed");
                counter!("harvest_index_failures_total", "kind" => kind).increment(1);
                false
            }
            Err(_) => {
                warn!(target: "harvest", kind, key, after = ?self.store_timeout, "document write timed out");
                counter!("harvest_index_failures_total", "kind" => kind).increment(1);
                false
            }
        }
    }
}
