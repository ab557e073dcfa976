// src/store/mod.rs
//! Document-store seam: per-document upsert, lifecycle, search and terms facets.
//!
//! Backends: `ElasticStore` (HTTP, production) and `MemoryStore` (in-process,
//! evaluates the same query tree; used by tests and local runs).

pub mod elastic;
pub mod mapping;
pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

use crate::domain::{ArticleDocument, CategoryDocument, PersonDocument, PublisherDocument};
use crate::error::StoreError;

pub use elastic::ElasticStore;
pub use memory::MemoryStore;
pub use query::{Query, SearchRequest};

/// Logical indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexName {
    Articles,
    Categories,
    People,
    Publishers,
}

impl IndexName {
    pub const ALL: [IndexName; 4] = [
        IndexName::Articles,
        IndexName::Categories,
        IndexName::People,
        IndexName::Publishers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::Articles => "article",
            IndexName::Categories => "category",
            IndexName::People => "people",
            IndexName::Publishers => "publisher",
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Created,
    Updated,
}

impl IndexOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, IndexOutcome::Created)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub source: Value,
}

/// Ranked hits plus a total that does not depend on the page size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub total: u64,
    pub hits: Vec<Hit>,
}

impl SearchHits {
    pub fn decode<T: DeserializeOwned>(self) -> Result<Vec<T>, StoreError> {
        self.hits
            .into_iter()
            .map(|h| serde_json::from_value(h.source).map_err(StoreError::from))
            .collect()
    }
}

/// Normalized form used for deterministic identities: trimmed, inner
/// whitespace collapsed, lowercased.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Deterministic document id: first 16 bytes of SHA-256, hex encoded.
pub fn stable_id(parts: &[&str]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(p.as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub fn category_id(name: &str) -> String {
    stable_id(&[&normalize_name(name)])
}

pub fn person_id(full_name: &str) -> String {
    stable_id(&[&normalize_name(full_name)])
}

pub fn publisher_id(name: &str) -> String {
    stable_id(&[&normalize_name(name)])
}

/// Articles carry no natural key; publisher + URL is used when a URL exists.
pub fn article_id(doc: &ArticleDocument) -> Option<String> {
    let url = doc.url.trim();
    if url.is_empty() {
        return None;
    }
    Some(stable_id(&[&normalize_name(&doc.publisher.name), url]))
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn exists(&self, index: IndexName) -> Result<bool, StoreError>;
    async fn delete(&self, index: IndexName) -> Result<(), StoreError>;
    async fn create(&self, index: IndexName, mapping: &Value) -> Result<(), StoreError>;

    /// Upsert one document. `None` lets the store assign the id.
    async fn index(
        &self,
        index: IndexName,
        id: Option<&str>,
        doc: &Value,
    ) -> Result<IndexOutcome, StoreError>;

    async fn search(
        &self,
        index: IndexName,
        request: &SearchRequest,
    ) -> Result<SearchHits, StoreError>;

    /// Distinct values of `field` with document counts, most frequent first.
    async fn aggregate(
        &self,
        index: IndexName,
        field: &str,
        size: usize,
    ) -> Result<Vec<crate::domain::FacetBucket>, StoreError>;

    async fn index_article(&self, doc: &ArticleDocument) -> Result<IndexOutcome, StoreError> {
        let body = serde_json::to_value(doc)?;
        let id = article_id(doc);
        self.index(IndexName::Articles, id.as_deref(), &body).await
    }

    async fn index_category(&self, doc: &CategoryDocument) -> Result<IndexOutcome, StoreError> {
        let body = serde_json::to_value(doc)?;
        let id = category_id(&doc.name);
        self.index(IndexName::Categories, Some(&id), &body).await
    }

    async fn index_person(&self, doc: &PersonDocument) -> Result<IndexOutcome, StoreError> {
        let body = serde_json::to_value(doc)?;
        let id = person_id(&doc.full_name);
        self.index(IndexName::People, Some(&id), &body).await
    }

    async fn index_publisher(&self, doc: &PublisherDocument) -> Result<IndexOutcome, StoreError> {
        let body = serde_json::to_value(doc)?;
        let id = publisher_id(&doc.name);
        self.index(IndexName::Publishers, Some(&id), &body).await
    }
}
