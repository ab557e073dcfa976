// src/store/elastic.rs
//! Elasticsearch backend over its REST API (`reqwest`).

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::query::SearchRequest;
use super::{DocumentStore, Hit, IndexName, IndexOutcome, SearchHits};
use crate::config::StoreConfig;
use crate::domain::FacetBucket;
use crate::error::StoreError;

#[derive(Clone)]
pub struct ElasticStore {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
    result: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
    #[serde(default)]
    aggregations: Option<Aggregations>,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: Total,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct Total {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

#[derive(Debug, Deserialize)]
struct Aggregations {
    facet: TermsAggregate,
}

#[derive(Debug, Deserialize)]
struct TermsAggregate {
    #[serde(default)]
    buckets: Vec<TermsBucket>,
}

#[derive(Debug, Deserialize)]
struct TermsBucket {
    key: Value,
    doc_count: u64,
}

impl ElasticStore {
    pub fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let timeout = Duration::from_secs(cfg.request_timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(concat!("news-aggregator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;
        let credentials = match (&cfg.username, &cfg.password) {
            (Some(u), Some(p)) => Some((u.clone(), p.clone())),
            _ => None,
        };
        Ok(Self {
            client,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            credentials,
            timeout,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let rb = self.client.request(method, url);
        match &self.credentials {
            Some((u, p)) => rb.basic_auth(u, Some(p)),
            None => rb,
        }
    }

    async fn send(&self, rb: RequestBuilder) -> Result<Response, StoreError> {
        match rb.send().await {
            Ok(resp) => Ok(resp),
            Err(e) if e.is_timeout() => Err(StoreError::Timeout(self.timeout)),
            Err(e) => Err(StoreError::Transport(e)),
        }
    }

    async fn ok_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn run_search(&self, index: IndexName, body: &Value) -> Result<SearchResponse, StoreError> {
        let resp = self
            .send(
                self.request(Method::POST, &format!("{index}/_search"))
                    .json(body),
            )
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::UnknownIndex(index.to_string()));
        }
        Self::ok_json(resp).await
    }
}

#[async_trait]
impl DocumentStore for ElasticStore {
    async fn exists(&self, index: IndexName) -> Result<bool, StoreError> {
        let resp = self.send(self.request(Method::HEAD, index.as_str())).await?;
        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(StoreError::Status {
                status: other.as_u16(),
                body: String::new(),
            }),
        }
    }

    async fn delete(&self, index: IndexName) -> Result<(), StoreError> {
        let resp = self.send(self.request(Method::DELETE, index.as_str())).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::UnknownIndex(index.to_string()));
        }
        let _: Value = Self::ok_json(resp).await?;
        info!(target: "store", %index, "index deleted");
        Ok(())
    }

    async fn create(&self, index: IndexName, mapping: &Value) -> Result<(), StoreError> {
        let resp = self
            .send(self.request(Method::PUT, index.as_str()).json(mapping))
            .await?;
        let _: Value = Self::ok_json(resp).await?;
        Ok(())
    }

    async fn index(
        &self,
        index: IndexName,
        id: Option<&str>,
        doc: &Value,
    ) -> Result<IndexOutcome, StoreError> {
        let rb = match id {
            Some(id) => self.request(Method::PUT, &format!("{index}/_doc/{id}")),
            None => self.request(Method::POST, &format!("{index}/_doc")),
        };
        let resp = self.send(rb.json(doc)).await?;
        let out: IndexResponse = Self::ok_json(resp).await?;
        debug!(target: "store", %index, id = %out.id, result = %out.result, "document indexed");
        Ok(if out.result == "created" {
            IndexOutcome::Created
        } else {
            IndexOutcome::Updated
        })
    }

    async fn search(
        &self,
        index: IndexName,
        request: &SearchRequest,
    ) -> Result<SearchHits, StoreError> {
        let resp = self.run_search(index, &request.to_json()).await?;
        Ok(SearchHits {
            total: resp.hits.total.value,
            hits: resp
                .hits
                .hits
                .into_iter()
                .map(|h| Hit {
                    id: h.id,
                    source: h.source,
                })
                .collect(),
        })
    }

    async fn aggregate(
        &self,
        index: IndexName,
        field: &str,
        size: usize,
    ) -> Result<Vec<FacetBucket>, StoreError> {
        let body = json!({
            "size": 0,
            "aggs": { "facet": { "terms": { "field": field, "size": size } } }
        });
        let resp = self.run_search(index, &body).await?;
        let buckets = resp.aggregations.map(|a| a.facet.buckets).unwrap_or_default();
        Ok(buckets
            .into_iter()
            .map(|b| FacetBucket {
                key: match b.key {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                doc_count: b.doc_count,
            })
            .collect())
    }
}
