// src/ingest/fetcher.rs
use async_trait::async_trait;
use std::time::Duration;

use super::parser::parse_feed;
use super::types::{FeedFetcher, FeedItem};
use crate::error::FetchError;

/// `reqwest`-backed fetcher. One shared client; the deadline covers connect,
/// headers and body.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("news-aggregator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http {
                url: String::new(),
                source: e,
            })?;
        Ok(Self { client })
    }

    /// Bring your own client (proxy, TLS and pool settings).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let http = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http)?;
        resp.text().await.map_err(http)
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch_feed(&self, url: &str, deadline: Duration) -> Result<Vec<FeedItem>, FetchError> {
        let body = tokio::time::timeout(deadline, self.get_body(url))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                after: deadline,
            })??;
        let items = parse_feed(&body)?;
        tracing::debug!(target: "fetch", url, items = items.len(), "feed parsed");
        Ok(items)
    }
}
