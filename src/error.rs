//! Error types for the collaborator seams.
//!
//! Only registry-level and query-level failures ever reach a caller as hard
//! errors; fetch and store failures inside a harvest are logged and absorbed.

use std::time::Duration;

/// Failure of the source registry (counting or paging sources).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry unavailable: {0}")]
    Unavailable(String),
    #[error("source `{source_id}` references unknown publisher `{publisher_id}`")]
    DanglingPublisher {
        source_id: String,
        publisher_id: String,
    },
    #[error("reading registry file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing registry file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failure to retrieve or parse one feed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("fetching {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
    #[error("http error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed feed: {0}")]
    Parse(String),
}

/// Failure talking to the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request timed out after {0:?}")]
    Timeout(Duration),
    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unknown index `{0}`")]
    UnknownIndex(String),
    #[error("decoding store document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Request-level search failure. Never accompanied by partial results.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fatal harvest failure. Everything below the registry is absorbed.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("cannot count sources: {0}")]
    Count(#[source] RegistryError),
    #[error("cannot read source batch {batch}/{batches}: {source}")]
    Batch {
        batch: usize,
        batches: usize,
        #[source]
        source: RegistryError,
    },
}
