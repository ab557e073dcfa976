// src/domain/article.rs
//! Documents written to (and read back from) the search store.
//! Field names follow the index mappings in `store::mapping`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::source::{GeoPoint, Publisher};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressDoc {
    pub coords: GeoPoint,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
}

impl From<&Publisher> for AddressDoc {
    fn from(p: &Publisher) -> Self {
        Self {
            coords: p.location,
            country: p.country.clone(),
            city: p.city.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublisherRef {
    pub name: String,
    #[serde(default)]
    pub address: AddressDoc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonDocument {
    #[serde(rename = "fullName")]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryDocument {
    pub name: String,
}

/// One harvested news item. Articles are inserted, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(default)]
    pub address: AddressDoc,
    pub publisher: PublisherRef,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub people: Vec<PersonDocument>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(rename = "datePublished")]
    pub date_published: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Entry of the dedicated publisher-name index used for autocomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherDocument {
    pub name: String,
    #[serde(rename = "add_date")]
    pub added_at: DateTime<Utc>,
}

/// Typed terms-aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub key: String,
    pub doc_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageHint {
    pub name: String,
}
