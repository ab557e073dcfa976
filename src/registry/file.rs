// src/registry/file.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::SourceRegistry;
use crate::domain::{GeoPoint, Publisher, Source};
use crate::error::RegistryError;

/// Read-only registry held in memory, optionally loaded from a TOML file:
///
/// ```toml
/// [[publishers]]
/// id = "nyt"
/// name = "The New York Times"
/// country = "US"
/// city = "New York"
/// latitude = 40.7561
/// longitude = -73.9903
///
/// [[sources]]
/// id = "nyt-world"
/// url = "https://rss.nytimes.com/services/xml/rss/nyt/World.xml"
/// publisher = "nyt"
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    sources: Vec<Source>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    publishers: Vec<PublisherRow>,
    #[serde(default)]
    sources: Vec<SourceRow>,
}

#[derive(Debug, Deserialize)]
struct PublisherRow {
    id: String,
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    added_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct SourceRow {
    id: String,
    url: String,
    publisher: String,
    #[serde(default)]
    added_at: Option<DateTime<Utc>>,
}

impl StaticRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(s)?;
        let now = Utc::now();

        let publishers: HashMap<String, Publisher> = file
            .publishers
            .into_iter()
            .map(|p| {
                let publisher = Publisher {
                    id: p.id.clone(),
                    name: p.name.trim().to_string(),
                    country: p.country,
                    city: p.city,
                    location: GeoPoint {
                        lat: p.latitude,
                        lon: p.longitude,
                    },
                    added_at: p.added_at.unwrap_or(now),
                };
                (p.id, publisher)
            })
            .collect();

        let sources = file
            .sources
            .into_iter()
            .map(|row| {
                let publisher = publishers.get(&row.publisher).cloned().ok_or_else(|| {
                    RegistryError::DanglingPublisher {
                        source_id: row.id.clone(),
                        publisher_id: row.publisher.clone(),
                    }
                })?;
                Ok(Source {
                    id: row.id,
                    feed_url: row.url.trim().to_string(),
                    publisher,
                    added_at: row.added_at.unwrap_or(now),
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;

        Ok(Self { sources })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl SourceRegistry for StaticRegistry {
    async fn count(&self) -> Result<u64, RegistryError> {
        Ok(self.sources.len() as u64)
    }

    async fn find_batch_with_publisher(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Source>, RegistryError> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self.sources.iter().skip(start).take(take).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
[[publishers]]
id = "nyt"
name = " The New York Times "
country = "US"
city = "New York"
latitude = 40.75
longitude = -73.99

[[sources]]
id = "a"
url = "https://example.test/a.xml"
publisher = "nyt"

[[sources]]
id = "b"
url = "https://example.test/b.xml"
publisher = "nyt"

[[sources]]
id = "c"
url = "https://example.test/c.xml"
publisher = "nyt"
"#;

    #[tokio::test]
    async fn pages_are_joined_with_publishers() {
        let reg = StaticRegistry::from_toml_str(TOML).unwrap();
        assert_eq!(reg.count().await.unwrap(), 3);

        let page = reg.find_batch_with_publisher(2, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "c");
        assert_eq!(page[0].publisher.name, "The New York Times");
        assert_eq!(page[0].publisher.location.lat, 40.75);

        assert!(reg.find_batch_with_publisher(10, 2).await.unwrap().is_empty());
    }

    #[test]
    fn unknown_publisher_is_rejected() {
        let bad = r#"
[[sources]]
id = "x"
url = "https://example.test/x.xml"
publisher = "missing"
"#;
        let err = StaticRegistry::from_toml_str(bad).unwrap_err();
        assert!(matches!(err, RegistryError::DanglingPublisher { .. }));
    }
}
