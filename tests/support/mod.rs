// tests/support/mod.rs
//
// Test doubles shared by the integration tests: a scripted feed fetcher, a
// registry that records its pages (or fails on demand) and a store wrapper
// that rejects writes to one index.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use news_aggregator::domain::{FacetBucket, GeoPoint, Publisher, Source};
use news_aggregator::error::{FetchError, RegistryError, StoreError};
use news_aggregator::ingest::harvest::HarvestSettings;
use news_aggregator::ingest::{FeedFetcher, FeedItem};
use news_aggregator::registry::{SourceRegistry, StaticRegistry};
use news_aggregator::store::{
    DocumentStore, IndexName, IndexOutcome, MemoryStore, SearchHits, SearchRequest,
};

pub fn publisher(name: &str, country: &str) -> Publisher {
    Publisher {
        id: name.to_lowercase().replace(' ', "-"),
        name: name.to_string(),
        country: country.to_string(),
        city: "City".to_string(),
        location: GeoPoint { lat: 1.0, lon: 2.0 },
        added_at: Utc::now(),
    }
}

pub fn source(i: usize, publisher: &Publisher) -> Source {
    Source {
        id: format!("src-{i}"),
        feed_url: format!("https://feeds.example.test/{i}.xml"),
        publisher: publisher.clone(),
        added_at: Utc::now(),
    }
}

/// An item published `age` ago.
pub fn item(title: &str, link: &str, age: ChronoDuration) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        description: format!("{title} description"),
        link: link.to_string(),
        links: vec![link.to_string()],
        published: Some(Utc::now() - age),
        language: Some("en-US".to_string()),
        ..FeedItem::default()
    }
}

pub fn settings(batch_size: u64) -> HarvestSettings {
    HarvestSettings {
        batch_size,
        fresh_window: Duration::from_secs(20 * 60),
        fetch_timeout: Duration::from_secs(2),
        store_timeout: Duration::from_secs(2),
    }
}

/// Fetcher answering from a script; unknown URLs fail.
#[derive(Default)]
pub struct ScriptedFetcher {
    feeds: Mutex<HashMap<String, Result<Vec<FeedItem>, String>>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(self, url: &str, items: Vec<FeedItem>) -> Self {
        self.feeds.lock().insert(url.to_string(), Ok(items));
        self
    }

    pub fn failing(self, url: &str, msg: &str) -> Self {
        self.feeds.lock().insert(url.to_string(), Err(msg.to_string()));
        self
    }

    pub fn slow(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch_feed(&self, url: &str, _deadline: Duration) -> Result<Vec<FeedItem>, FetchError> {
        self.calls.lock().push(url.to_string());
        let delay = *self.delay.lock();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let scripted = self.feeds.lock().get(url).cloned();
        match scripted {
            Some(Ok(items)) => Ok(items),
            Some(Err(msg)) => Err(FetchError::Parse(msg)),
            None => Err(FetchError::Parse(format!("no feed scripted for {url}"))),
        }
    }
}

/// Wraps a `StaticRegistry`, recording `(offset, limit)` of every page read.
pub struct RecordingRegistry {
    inner: StaticRegistry,
    pages: Mutex<Vec<(u64, u64)>>,
    fail_count: bool,
    fail_page: Option<u64>,
}

impl RecordingRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            inner: StaticRegistry::new(sources),
            pages: Mutex::new(Vec::new()),
            fail_count: false,
            fail_page: None,
        }
    }

    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    pub fn failing_page_at(mut self, offset: u64) -> Self {
        self.fail_page = Some(offset);
        self
    }

    pub fn pages(&self) -> Vec<(u64, u64)> {
        self.pages.lock().clone()
    }
}

#[async_trait]
impl SourceRegistry for RecordingRegistry {
    async fn count(&self) -> Result<u64, RegistryError> {
        if self.fail_count {
            return Err(RegistryError::Unavailable("connection refused".into()));
        }
        self.inner.count().await
    }

    async fn find_batch_with_publisher(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Source>, RegistryError> {
        self.pages.lock().push((offset, limit));
        if self.fail_page == Some(offset) {
            return Err(RegistryError::Unavailable("page read failed".into()));
        }
        self.inner.find_batch_with_publisher(offset, limit).await
    }
}

/// `MemoryStore` that rejects every write to `broken`.
pub struct BrokenIndexStore {
    pub inner: MemoryStore,
    pub broken: IndexName,
}

#[async_trait]
impl DocumentStore for BrokenIndexStore {
    async fn exists(&self, index: IndexName) -> Result<bool, StoreError> {
        self.inner.exists(index).await
    }

    async fn delete(&self, index: IndexName) -> Result<(), StoreError> {
        self.inner.delete(index).await
    }

    async fn create(&self, index: IndexName, mapping: &Value) -> Result<(), StoreError> {
        self.inner.create(index, mapping).await
    }

    async fn index(
        &self,
        index: IndexName,
        id: Option<&str>,
        doc: &Value,
    ) -> Result<IndexOutcome, StoreError> {
        if index == self.broken {
            return Err(StoreError::Backend(format!("{index} is read-only")));
        }
        self.inner.index(index, id, doc).await
    }

    async fn search(
        &self,
        index: IndexName,
        request: &SearchRequest,
    ) -> Result<SearchHits, StoreError> {
        self.inner.search(index, request).await
    }

    async fn aggregate(
        &self,
        index: IndexName,
        field: &str,
        size: usize,
    ) -> Result<Vec<FacetBucket>, StoreError> {
        self.inner.aggregate(index, field, size).await
    }
}

/// `MemoryStore` whose writes to `stalled` hang for `delay` before landing.
pub struct StallingStore {
    pub inner: MemoryStore,
    pub stalled: IndexName,
    pub delay: Duration,
}

#[async_trait]
impl DocumentStore for StallingStore {
    async fn exists(&self, index: IndexName) -> Result<bool, StoreError> {
        self.inner.exists(index).await
    }

    async fn delete(&self, index: IndexName) -> Result<(), StoreError> {
        self.inner.delete(index).await
    }

    async fn create(&self, index: IndexName, mapping: &Value) -> Result<(), StoreError> {
        self.inner.create(index, mapping).await
    }

    async fn index(
        &self,
        index: IndexName,
        id: Option<&str>,
        doc: &Value,
    ) -> Result<IndexOutcome, StoreError> {
        if index == self.stalled {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.index(index, id, doc).await
    }

    async fn search(
        &self,
        index: IndexName,
        request: &SearchRequest,
    ) -> Result<SearchHits, StoreError> {
        self.inner.search(index, request).await
    }

    async fn aggregate(
        &self,
        index: IndexName,
        field: &str,
        size: usize,
    ) -> Result<Vec<FacetBucket>, StoreError> {
        self.inner.aggregate(index, field, size).await
    }
}
