// src/domain/filter.rs
//! GrandFilter request shape: independent dimensions, OR within a dimension,
//! AND across dimensions. Missing or empty dimensions impose no constraint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchString {
    #[serde(default)]
    pub search: String,
    #[serde(rename = "isExact", default)]
    pub is_exact: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPerson {
    #[serde(rename = "fullName", default)]
    pub full_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPublisher {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCountry {
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCategory {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchLanguage {
    #[serde(default)]
    pub name: String,
}

/// Inclusive publish-time bounds; either side may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTime {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

impl SearchTime {
    pub fn is_empty(&self) -> bool {
        self.start.trim().is_empty() && self.end.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandFilterRequest {
    /// Every entry is required on its own (AND).
    #[serde(default)]
    pub filter_strings: Vec<SearchString>,
    #[serde(default)]
    pub filter_people: Vec<SearchPerson>,
    #[serde(default)]
    pub filter_publishers: Vec<SearchPublisher>,
    #[serde(default)]
    pub filter_country: Vec<SearchCountry>,
    #[serde(default)]
    pub filter_categories: Vec<SearchCategory>,
    #[serde(default)]
    pub filter_languages: Vec<SearchLanguage>,
    #[serde(default)]
    pub filter_time: SearchTime,
}
