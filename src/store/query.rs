// src/store/query.rs
//! Boolean query tree understood by every store backend.
//!
//! `to_json` renders the Elasticsearch query DSL; the in-memory backend
//! evaluates the same tree directly.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOperator {
    Or,
    And,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub should: Vec<Query>,
    pub minimum_should_match: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Bool(BoolQuery),
    Match {
        field: String,
        query: String,
        operator: MatchOperator,
    },
    Fuzzy {
        field: String,
        value: String,
    },
    /// Inclusive bounds, RFC 3339 strings.
    Range {
        field: String,
        gte: Option<String>,
        lte: Option<String>,
    },
}

impl Query {
    pub fn match_field(field: &str, query: impl Into<String>) -> Self {
        Query::Match {
            field: field.to_string(),
            query: query.into(),
            operator: MatchOperator::Or,
        }
    }

    pub fn match_all_tokens(field: &str, query: impl Into<String>) -> Self {
        Query::Match {
            field: field.to_string(),
            query: query.into(),
            operator: MatchOperator::And,
        }
    }

    pub fn fuzzy(field: &str, value: impl Into<String>) -> Self {
        Query::Fuzzy {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Every clause must match.
    pub fn all_of(clauses: Vec<Query>) -> Self {
        Query::Bool(BoolQuery {
            must: clauses,
            ..BoolQuery::default()
        })
    }

    /// At least one clause must match.
    pub fn any_of(clauses: Vec<Query>) -> Self {
        Query::Bool(BoolQuery {
            should: clauses,
            minimum_should_match: Some(1),
            ..BoolQuery::default()
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Bool(b) => {
                let mut body = Map::new();
                if !b.must.is_empty() {
                    body.insert(
                        "must".into(),
                        Value::Array(b.must.iter().map(Query::to_json).collect()),
                    );
                }
                if !b.should.is_empty() {
                    body.insert(
                        "should".into(),
                        Value::Array(b.should.iter().map(Query::to_json).collect()),
                    );
                }
                if let Some(n) = b.minimum_should_match {
                    body.insert("minimum_should_match".into(), json!(n));
                }
                json!({ "bool": body })
            }
            Query::Match {
                field,
                query,
                operator,
            } => {
                let op = match operator {
                    MatchOperator::Or => "or",
                    MatchOperator::And => "and",
                };
                json!({ "match": { field: { "query": query, "operator": op } } })
            }
            Query::Fuzzy { field, value } => {
                json!({ "fuzzy": { field: { "value": value, "fuzziness": "AUTO" } } })
            }
            Query::Range { field, gte, lte } => {
                let mut bounds = Map::new();
                if let Some(g) = gte {
                    bounds.insert("gte".into(), json!(g));
                }
                if let Some(l) = lte {
                    bounds.insert("lte".into(), json!(l));
                }
                json!({ "range": { field: bounds } })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

/// One search call: optional query, page size, sort keys.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Option<Query>,
    pub size: usize,
    pub sort: Vec<SortField>,
}

impl SearchRequest {
    pub fn new(size: usize) -> Self {
        Self {
            query: None,
            size,
            sort: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    pub fn sorted_desc(mut self, field: &str) -> Self {
        self.sort.push(SortField {
            field: field.to_string(),
            order: SortOrder::Desc,
        });
        self
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("size".into(), json!(self.size));
        // Totals must not be capped at the default 10k window.
        body.insert("track_total_hits".into(), json!(true));
        if let Some(q) = &self.query {
            body.insert("query".into(), q.to_json());
        }
        if !self.sort.is_empty() {
            let sort = self
                .sort
                .iter()
                .map(|s| {
                    let order = match s.order {
                        SortOrder::Asc => "asc",
                        SortOrder::Desc => "desc",
                    };
                    json!({ &s.field: { "order": order } })
                })
                .collect();
            body.insert("sort".into(), Value::Array(sort));
        }
        Value::Object(body)
    }
}
