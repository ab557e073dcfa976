// src/domain/source.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A news outlet. Copied into every article at harvest time, so later edits
/// do not touch documents that are already indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub location: GeoPoint,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

/// A registered feed URL tied to one publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub feed_url: String,
    pub publisher: Publisher,
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}
