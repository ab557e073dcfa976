// src/search/mod.rs
pub mod compiler;
pub mod hints;

pub use compiler::{compile, parse_page_size, DEFAULT_PAGE_SIZE};
pub use hints::{HintService, PublisherHint};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::{ArticleDocument, GrandFilterRequest};
use crate::error::SearchError;
use crate::store::{DocumentStore, IndexName};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("search_requests_total", "GrandFilter searches, by outcome.");
        describe_histogram!(
            "search_duration_seconds",
            "GrandFilter compile + store round trip."
        );
    });
}

/// Ranked articles plus the total match count (independent of page size).
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub articles: Vec<ArticleDocument>,
    pub total: u64,
}

#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn DocumentStore>,
    max_page_size: usize,
}

impl SearchService {
    pub fn new(store: Arc<dyn DocumentStore>, max_page_size: usize) -> Self {
        Self {
            store,
            max_page_size: max_page_size.max(1),
        }
    }

    /// Compile and execute one GrandFilter request. Any failure fails the
    /// whole request.
    pub async fn search(
        &self,
        req: &GrandFilterRequest,
        size: usize,
    ) -> Result<SearchResult, SearchError> {
        ensure_metrics_described();
        let t0 = Instant::now();
        let result = self.run(req, size).await;
        histogram!("search_duration_seconds").record(t0.elapsed().as_secs_f64());

        let outcome = if result.is_ok() { "ok" } else { "error" };
        counter!("search_requests_total", "outcome" => outcome).increment(1);
        match &result {
            Ok(r) => tracing::info!(
                target: "search",
                total = r.total,
                returned = r.articles.len(),
                "grand filter"
            ),
            Err(e) => tracing::warn!(target: "search", error = %e, "grand filter failed"),
        }
        result
    }

    async fn run(&self, req: &GrandFilterRequest, size: usize) -> Result<SearchResult, SearchError> {
        let size = size.clamp(1, self.max_page_size);
        let request = compile(req, size)?;
        let hits = self.store.search(IndexName::Articles, &request).await?;
        let total = hits.total;
        Ok(SearchResult {
            articles: hits.decode()?,
            total,
        })
    }
}
