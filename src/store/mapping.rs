// src/store/mapping.rs
//! Index settings/mappings and (re)provisioning.
//!
//! Full-text fields use an ngram analyzer so partial words match; facet fields
//! are keywords with a lowercase normalizer so facet filters are case-insensitive.

use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::{info, warn};

use super::{DocumentStore, IndexName};
use crate::domain::PublisherDocument;
use crate::error::{RegistryError, StoreError};
use crate::registry::SourceRegistry;

const NORMALIZER: &str = "lowercase_normalizer";

fn keyword() -> Value {
    json!({ "type": "keyword", "normalizer": NORMALIZER })
}

fn address() -> Value {
    json!({
        "type": "object",
        "properties": {
            "country": keyword(),
            "city": keyword(),
            "coords": { "type": "geo_point" }
        }
    })
}

fn ngram_settings(prefix: &str, token_chars: &[&str], max_gram: u32, search_tokenizer: &str) -> Value {
    json!({
        "max_ngram_diff": max_gram,
        "analysis": {
            "tokenizer": {
                format!("{prefix}_tokenizer"): {
                    "type": "ngram",
                    "min_gram": 2,
                    "max_gram": max_gram,
                    "token_chars": token_chars
                }
            },
            "analyzer": {
                format!("{prefix}_analyzer"): {
                    "type": "custom",
                    "tokenizer": format!("{prefix}_tokenizer"),
                    "filter": ["lowercase"]
                },
                format!("{prefix}_search_analyzer"): {
                    "type": "custom",
                    "tokenizer": search_tokenizer,
                    "filter": ["lowercase"]
                }
            },
            "normalizer": {
                NORMALIZER: { "type": "custom", "filter": ["lowercase"] }
            }
        }
    })
}

fn ngram_text(prefix: &str) -> Value {
    json!({
        "type": "text",
        "analyzer": format!("{prefix}_analyzer"),
        "search_analyzer": format!("{prefix}_search_analyzer")
    })
}

/// Settings + mappings body for `PUT /<index>`.
pub fn mapping_for(index: IndexName) -> Value {
    let wide_chars = ["letter", "digit", "whitespace", "punctuation", "symbol"];
    match index {
        IndexName::Articles => json!({
            "settings": ngram_settings("article", &["letter", "digit"], 20, "whitespace"),
            "mappings": { "properties": {
                "name": ngram_text("article"),
                "description": ngram_text("article"),
                "URL": { "type": "keyword" },
                "categories": keyword(),
                "address": address(),
                "publisher": {
                    "type": "object",
                    "properties": { "name": keyword(), "address": address() }
                },
                "people": {
                    "type": "object",
                    "properties": { "fullName": keyword() }
                },
                "links": { "type": "keyword" },
                "language": keyword(),
                "datePublished": { "type": "date" }
            }}
        }),
        IndexName::Categories => json!({
            "settings": ngram_settings("category", &wide_chars, 20, "keyword"),
            "mappings": { "properties": { "name": ngram_text("category") } }
        }),
        IndexName::People => json!({
            "settings": ngram_settings("people", &wide_chars, 20, "keyword"),
            "mappings": { "properties": { "fullName": ngram_text("people") } }
        }),
        IndexName::Publishers => json!({
            "settings": ngram_settings("publisher", &["letter", "digit", "whitespace"], 30, "keyword"),
            "mappings": { "properties": {
                "name": ngram_text("publisher"),
                "add_date": { "type": "date" }
            }}
        }),
    }
}

/// Create every missing index; with `wipe`, drop existing ones first.
pub async fn provision(store: &dyn DocumentStore, wipe: bool) -> Result<(), StoreError> {
    for index in IndexName::ALL {
        let exists = store.exists(index).await?;
        if exists && wipe {
            info!(target: "store", %index, "index exists, deleting");
            store.delete(index).await?;
        } else if exists {
            continue;
        }
        store.create(index, &mapping_for(index)).await?;
        info!(target: "store", %index, "index created");
    }
    Ok(())
}

/// Fill the publisher hint index from the registry. Returns how many distinct
/// publishers were visited; individual write failures are logged and skipped.
pub async fn seed_publishers(
    store: &dyn DocumentStore,
    registry: &dyn SourceRegistry,
    batch_size: u64,
) -> Result<usize, RegistryError> {
    let batch_size = batch_size.max(1);
    let total = registry.count().await?;
    let mut seen = HashSet::new();
    let mut offset = 0;
    while offset < total {
        for src in registry.find_batch_with_publisher(offset, batch_size).await? {
            let name = src.publisher.name.trim().to_string();
            if name.is_empty() || !seen.insert(super::normalize_name(&name)) {
                continue;
            }
            let doc = PublisherDocument {
                name,
                added_at: Utc::now(),
            };
            if let Err(e) = store.index_publisher(&doc).await {
                warn!(target: "store", error = %e, publisher = %doc.name, "publisher hint not indexed");
            }
        }
        offset += batch_size;
    }
    Ok(seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_facets_are_normalized_keywords() {
        let m = mapping_for(IndexName::Articles);
        let props = &m["mappings"]["properties"];
        assert_eq!(props["address"]["properties"]["country"]["type"], "keyword");
        assert_eq!(props["publisher"]["properties"]["name"]["normalizer"], NORMALIZER);
        assert_eq!(props["people"]["properties"]["fullName"]["type"], "keyword");
        assert_eq!(props["name"]["type"], "text");
        assert_eq!(props["datePublished"]["type"], "date");
    }

    #[tokio::test]
    async fn wipe_recreates_every_index_empty() {
        let store = crate::store::MemoryStore::new();
        provision(&store, false).await.unwrap();
        store
            .index(IndexName::Articles, Some("a1"), &json!({ "name": "kept" }))
            .await
            .unwrap();

        // second plain pass leaves existing data alone
        provision(&store, false).await.unwrap();
        assert_eq!(store.doc_count(IndexName::Articles), 1);

        provision(&store, true).await.unwrap();
        assert_eq!(store.doc_count(IndexName::Articles), 0);
        for index in IndexName::ALL {
            assert!(store.exists(index).await.unwrap());
        }
    }
}
