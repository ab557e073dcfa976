// src/search/hints.rs
//! Autocomplete reads: publishers, categories, people, languages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::domain::{CategoryDocument, LanguageHint, PersonDocument, PublisherDocument};
use crate::error::{SearchError, StoreError};
use crate::store::{DocumentStore, IndexName, Query, SearchRequest};

pub const PUBLISHER_HINTS: usize = 5;
pub const FACET_HINTS: usize = 20;
pub const LANGUAGE_BUCKETS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherHint {
    pub publisher_id: String,
    pub name: String,
    pub add_date: DateTime<Utc>,
}

#[derive(Clone)]
pub struct HintService {
    store: Arc<dyn DocumentStore>,
}

impl HintService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fuzzy name match; an empty query returns a default page.
    pub async fn publishers(&self, query: &str) -> Result<Vec<PublisherHint>, SearchError> {
        let q = query.trim().to_lowercase();
        let mut req = SearchRequest::new(PUBLISHER_HINTS);
        if !q.is_empty() {
            req = req.with_query(Query::fuzzy("name", q.clone()));
        }
        let hits = self.store.search(IndexName::Publishers, &req).await?;
        info!(target: "hints", query = %q, total = hits.total, "publisher hints");
        hits.hits
            .into_iter()
            .map(|h| -> Result<PublisherHint, SearchError> {
                let doc: PublisherDocument =
                    serde_json::from_value(h.source).map_err(StoreError::from)?;
                Ok(PublisherHint {
                    publisher_id: h.id,
                    name: doc.name,
                    add_date: doc.added_at,
                })
            })
            .collect()
    }

    pub async fn categories(&self, query: &str) -> Result<Vec<CategoryDocument>, SearchError> {
        let hits = self
            .store
            .search(IndexName::Categories, &facet_request("name", query))
            .await?;
        info!(target: "hints", query, total = hits.total, "category hints");
        Ok(hits.decode()?)
    }

    pub async fn people(&self, query: &str) -> Result<Vec<PersonDocument>, SearchError> {
        let hits = self
            .store
            .search(IndexName::People, &facet_request("fullName", query))
            .await?;
        info!(target: "hints", query, total = hits.total, "people hints");
        Ok(hits.decode()?)
    }

    /// Distinct article languages, most common first.
    pub async fn languages(&self) -> Result<Vec<LanguageHint>, SearchError> {
        let buckets = self
            .store
            .aggregate(IndexName::Articles, "language", LANGUAGE_BUCKETS)
            .await?;
        info!(target: "hints", count = buckets.len(), "languages");
        Ok(buckets
            .into_iter()
            .map(|b| LanguageHint { name: b.key })
            .collect())
    }
}

fn facet_request(field: &str, query: &str) -> SearchRequest {
    let q = query.trim().to_lowercase();
    let req = SearchRequest::new(FACET_HINTS);
    if q.is_empty() {
        req
    } else {
        req.with_query(Query::match_field(field, q))
    }
}
