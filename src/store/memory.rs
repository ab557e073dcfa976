// src/store/memory.rs
//! In-process store that evaluates the query tree the way the provisioned
//! indices behave:
//! - keyword fields: whole-value, case-insensitive equality
//! - text fields (ngram-analyzed): every/any query token is a substring
//! - fuzzy: substring or Levenshtein distance within `AUTO` fuzziness
//!
//! Field kinds are read from the mapping passed to `create`; unmapped fields
//! are treated as text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use super::query::{BoolQuery, MatchOperator, Query, SearchRequest, SortOrder};
use super::{DocumentStore, Hit, IndexName, IndexOutcome, SearchHits};
use crate::domain::FacetBucket;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct MemIndex {
    mapping: Value,
    docs: Vec<(String, Value)>,
    positions: HashMap<String, usize>,
    next_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Keyword { normalized: bool },
    Text,
    Date,
}

impl MemIndex {
    fn with_mapping(mapping: Value) -> Self {
        Self {
            mapping,
            ..Self::default()
        }
    }

    fn kind(&self, field: &str) -> FieldKind {
        let mut node = match self.mapping.get("mappings") {
            Some(m) => m,
            None => return FieldKind::Text,
        };
        for seg in field.split('.') {
            match node.get("properties").and_then(|p| p.get(seg)) {
                Some(n) => node = n,
                None => return FieldKind::Text,
            }
        }
        match node.get("type").and_then(Value::as_str) {
            Some("keyword") => FieldKind::Keyword {
                normalized: node.get("normalizer").is_some(),
            },
            Some("date") => FieldKind::Date,
            _ => FieldKind::Text,
        }
    }

    fn upsert(&mut self, id: Option<&str>, doc: &Value) -> IndexOutcome {
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                self.next_id += 1;
                format!("mem-{}", self.next_id)
            }
        };
        match self.positions.get(&id) {
            Some(&pos) => {
                self.docs[pos].1 = doc.clone();
                IndexOutcome::Updated
            }
            None => {
                self.positions.insert(id.clone(), self.docs.len());
                self.docs.push((id, doc.clone()));
                IndexOutcome::Created
            }
        }
    }

    fn matches(&self, doc: &Value, q: &Query) -> bool {
        match q {
            Query::MatchAll => true,
            Query::Bool(b) => self.matches_bool(doc, b),
            Query::Match {
                field,
                query,
                operator,
            } => {
                let values = field_values(doc, field);
                match self.kind(field) {
                    FieldKind::Keyword { .. } => {
                        let wanted = query.trim().to_lowercase();
                        values.iter().any(|v| v.to_lowercase() == wanted)
                    }
                    FieldKind::Text | FieldKind::Date => {
                        let haystack = values.join(" ").to_lowercase();
                        let mut tokens = query.split_whitespace().map(str::to_lowercase);
                        match operator {
                            MatchOperator::And => {
                                let mut any = false;
                                let all = tokens.all(|t| {
                                    any = true;
                                    haystack.contains(&t)
                                });
                                any && all
                            }
                            MatchOperator::Or => tokens.any(|t| haystack.contains(&t)),
                        }
                    }
                }
            }
            Query::Fuzzy { field, value } => {
                let wanted = value.to_lowercase();
                if wanted.is_empty() {
                    return false;
                }
                let values = field_values(doc, field);
                match self.kind(field) {
                    FieldKind::Keyword { .. } => values
                        .iter()
                        .any(|v| within_fuzziness(&v.to_lowercase(), &wanted)),
                    FieldKind::Text | FieldKind::Date => values.iter().any(|v| {
                        v.to_lowercase()
                            .split(|c: char| !c.is_alphanumeric())
                            .filter(|w| !w.is_empty())
                            .any(|w| w.contains(&wanted) || within_fuzziness(w, &wanted))
                    }),
                }
            }
            Query::Range { field, gte, lte } => {
                let lo = gte.as_deref().and_then(parse_date);
                let hi = lte.as_deref().and_then(parse_date);
                field_values(doc, field)
                    .iter()
                    .filter_map(|v| parse_date(v))
                    .any(|d| lo.map_or(true, |lo| d >= lo) && hi.map_or(true, |hi| d <= hi))
            }
        }
    }

    fn matches_bool(&self, doc: &Value, b: &BoolQuery) -> bool {
        if !b.must.iter().all(|q| self.matches(doc, q)) {
            return false;
        }
        if b.should.is_empty() {
            return true;
        }
        let required = b
            .minimum_should_match
            .map(|n| n as usize)
            .unwrap_or(if b.must.is_empty() { 1 } else { 0 });
        b.should.iter().filter(|q| self.matches(doc, q)).count() >= required
    }
}

/// Levenshtein within Elasticsearch `AUTO` fuzziness (0 / 1 / 2 edits).
fn within_fuzziness(term: &str, wanted: &str) -> bool {
    let allowed = match wanted.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    };
    strsim::levenshtein(term, wanted) <= allowed
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Leaf values under a dotted path, flattening arrays at any depth.
fn field_values(doc: &Value, field: &str) -> Vec<String> {
    let path: Vec<&str> = field.split('.').collect();
    let mut out = Vec::new();
    collect_values(doc, &path, &mut out);
    out
}

fn collect_values(v: &Value, path: &[&str], out: &mut Vec<String>) {
    match (v, path.split_first()) {
        (Value::Array(items), _) => {
            for it in items {
                collect_values(it, path, out);
            }
        }
        (Value::Object(map), Some((head, rest))) => {
            if let Some(child) = map.get(*head) {
                collect_values(child, rest, out);
            }
        }
        (Value::String(s), None) => out.push(s.clone()),
        (Value::Number(n), None) => out.push(n.to_string()),
        (Value::Bool(b), None) => out.push(b.to_string()),
        _ => {}
    }
}

fn compare_for_sort(a: &Value, b: &Value, field: &str) -> Ordering {
    let first = |d: &Value| field_values(d, field).into_iter().next();
    match (first(a), first(b)) {
        (Some(x), Some(y)) => match (parse_date(&x), parse_date(&y)) {
            (Some(dx), Some(dy)) => dx.cmp(&dy),
            _ => x.cmp(&y),
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    indices: RwLock<HashMap<IndexName, MemIndex>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `index`.
    pub fn doc_count(&self, index: IndexName) -> usize {
        self.indices
            .read()
            .map(|g| g.get(&index).map_or(0, |i| i.docs.len()))
            .unwrap_or(0)
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("memory store lock poisoned".into())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn exists(&self, index: IndexName) -> Result<bool, StoreError> {
        let g = self.indices.read().map_err(|_| Self::poisoned())?;
        Ok(g.contains_key(&index))
    }

    async fn delete(&self, index: IndexName) -> Result<(), StoreError> {
        let mut g = self.indices.write().map_err(|_| Self::poisoned())?;
        g.remove(&index)
            .map(|_| ())
            .ok_or_else(|| StoreError::UnknownIndex(index.to_string()))
    }

    async fn create(&self, index: IndexName, mapping: &Value) -> Result<(), StoreError> {
        let mut g = self.indices.write().map_err(|_| Self::poisoned())?;
        if g.contains_key(&index) {
            return Err(StoreError::Status {
                status: 400,
                body: format!("resource_already_exists_exception: {index}"),
            });
        }
        g.insert(index, MemIndex::with_mapping(mapping.clone()));
        Ok(())
    }

    async fn index(
        &self,
        index: IndexName,
        id: Option<&str>,
        doc: &Value,
    ) -> Result<IndexOutcome, StoreError> {
        let mut g = self.indices.write().map_err(|_| Self::poisoned())?;
        Ok(g.entry(index).or_default().upsert(id, doc))
    }

    async fn search(
        &self,
        index: IndexName,
        request: &SearchRequest,
    ) -> Result<SearchHits, StoreError> {
        let g = self.indices.read().map_err(|_| Self::poisoned())?;
        let idx = g
            .get(&index)
            .ok_or_else(|| StoreError::UnknownIndex(index.to_string()))?;

        let mut matched: Vec<&(String, Value)> = idx
            .docs
            .iter()
            .filter(|(_, doc)| request.query.as_ref().map_or(true, |q| idx.matches(doc, q)))
            .collect();

        for key in request.sort.iter().rev() {
            matched.sort_by(|(_, a), (_, b)| {
                let ord = compare_for_sort(a, b, &key.field);
                match key.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        Ok(SearchHits {
            total: matched.len() as u64,
            hits: matched
                .into_iter()
                .take(request.size)
                .map(|(id, doc)| Hit {
                    id: id.clone(),
                    source: doc.clone(),
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
        let g = self.indices.read().map_err(|_| Self::poisoned())?;
        let idx = g
            .get(&index)
            .ok_or_else(|| StoreError::UnknownIndex(index.to_string()))?;
        let normalized = matches!(idx.kind(field), FieldKind::Keyword { normalized: true });

        let mut counts: HashMap<String, u64> = HashMap::new();
        for (_, doc) in &idx.docs {
            let mut keys = field_values(doc, field);
            if normalized {
                keys.iter_mut().for_each(|k| *k = k.to_lowercase());
            }
            keys.sort();
            keys.dedup();
            for k in keys {
                *counts.entry(k).or_default() += 1;
            }
        }

        let mut buckets: Vec<FacetBucket> = counts
            .into_iter()
            .map(|(key, doc_count)| FacetBucket { key, doc_count })
            .collect();
        buckets.sort_by(|a, b| b.doc_count.cmp(&a.doc_count).then_with(|| a.key.cmp(&b.key)));
        buckets.truncate(size);
        Ok(buckets)
    }
}
