// src/ingest/ner.rs
//! Placeholder for entity extraction: counts capitalized words
//! ("potential names/toponyms"). The count is logged per run, nothing more.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::FeedItem;

static CAPITALIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}\p{Ll}+").unwrap());

pub fn count_potential_names(items: &[FeedItem]) -> usize {
    items
        .iter()
        .flat_map(|it| it.description.split_whitespace())
        .filter(|w| CAPITALIZED.is_match(w))
        .count()
}
