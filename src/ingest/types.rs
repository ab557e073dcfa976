// src/ingest/types.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::FetchError;

/// One normalized feed entry. Produced by a fetch, consumed by one item task.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub links: Vec<String>,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    /// `None` when the feed carried no parseable timestamp.
    pub published: Option<DateTime<Utc>>,
    /// Feed-level language code as published (e.g. `en-US`).
    pub language: Option<String>,
}

/// Bounded-time retrieval + parse of one syndication URL. No internal retry.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch_feed(&self, url: &str, deadline: Duration) -> Result<Vec<FeedItem>, FetchError>;
}
