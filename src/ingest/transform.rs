// src/ingest/transform.rs
//! Feed item + publisher -> documents, and the freshness policy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use super::types::FeedItem;
use crate::domain::{
    AddressDoc, ArticleDocument, CategoryDocument, PersonDocument, Publisher, PublisherRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestMode {
    /// Only items inside the trailing window.
    Incremental,
    /// Everything with a timestamp (backfill, migration).
    Full,
}

impl HarvestMode {
    pub fn from_full(full: bool) -> Self {
        if full {
            HarvestMode::Full
        } else {
            HarvestMode::Incremental
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HarvestMode::Incremental => "incremental",
            HarvestMode::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Undated,
    Stale,
}

impl Skip {
    pub fn as_str(&self) -> &'static str {
        match self {
            Skip::Undated => "undated",
            Skip::Stale => "stale",
        }
    }
}

/// Decides whether an item is indexed. `now` is fixed once per run.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    pub mode: HarvestMode,
    pub window: Duration,
    pub now: DateTime<Utc>,
}

impl FreshnessPolicy {
    pub fn new(mode: HarvestMode, window: Duration, now: DateTime<Utc>) -> Self {
        Self { mode, window, now }
    }

    /// Returns the publish time of an item that should be indexed.
    pub fn check(&self, item: &FeedItem) -> Result<DateTime<Utc>, Skip> {
        let published = item.published.ok_or(Skip::Undated)?;
        if self.mode == HarvestMode::Full {
            return Ok(published);
        }
        let cutoff = chrono::Duration::from_std(self.window)
            .ok()
            .and_then(|w| self.now.checked_sub_signed(w));
        match cutoff {
            Some(cutoff) if published < cutoff => Err(Skip::Stale),
            _ => Ok(published),
        }
    }
}

/// Primary subtag, lower-cased: `en-US` -> `en`.
pub fn primary_language(tag: &str) -> Option<String> {
    let primary = tag
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    (!primary.is_empty()).then_some(primary)
}

/// Pure shape mapping; the address is the publisher's.
pub fn article_from_item(
    publisher: &Publisher,
    item: &FeedItem,
    published: DateTime<Utc>,
) -> ArticleDocument {
    let address = AddressDoc::from(publisher);
    ArticleDocument {
        name: item.title.clone(),
        description: item.description.clone(),
        url: item.link.clone(),
        address: address.clone(),
        publisher: PublisherRef {
            name: publisher.name.clone(),
            address,
        },
        categories: item.categories.clone(),
        people: people_from_item(item),
        links: item.links.clone(),
        date_published: published,
        language: item.language.as_deref().and_then(primary_language),
    }
}

pub fn categories_from_item(item: &FeedItem) -> Vec<CategoryDocument> {
    item.categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| CategoryDocument { name: c.to_string() })
        .collect()
}

pub fn people_from_item(item: &FeedItem) -> Vec<PersonDocument> {
    item.authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| PersonDocument {
            full_name: a.to_string(),
        })
        .collect()
}
