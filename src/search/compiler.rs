// src/search/compiler.rs
//! GrandFilter request -> one boolean query.
//!
//! OR inside a dimension, AND across dimensions; empty dimensions add no
//! clause. Results are always newest first.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::domain::filter::{SearchString, SearchTime};
use crate::domain::GrandFilterRequest;
use crate::error::SearchError;
use crate::store::query::{Query, SearchRequest};

pub const DEFAULT_PAGE_SIZE: usize = 150;

pub mod fields {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const COUNTRY: &str = "address.country";
    pub const PUBLISHER: &str = "publisher.name";
    pub const PEOPLE: &str = "people.fullName";
    pub const CATEGORIES: &str = "categories";
    pub const LANGUAGE: &str = "language";
    pub const DATE_PUBLISHED: &str = "datePublished";
}

/// `?size=` parsing: absent, unparsable or zero -> `DEFAULT_PAGE_SIZE`.
pub fn parse_page_size(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

pub fn compile(req: &GrandFilterRequest, size: usize) -> Result<SearchRequest, SearchError> {
    let mut must: Vec<Query> = req
        .filter_strings
        .iter()
        .filter_map(string_clause)
        .collect();

    let dimensions = [
        (
            fields::COUNTRY,
            req.filter_country.iter().map(|c| c.country.as_str()).collect::<Vec<_>>(),
        ),
        (
            fields::PUBLISHER,
            req.filter_publishers.iter().map(|p| p.name.as_str()).collect(),
        ),
        (
            fields::PEOPLE,
            req.filter_people.iter().map(|p| p.full_name.as_str()).collect(),
        ),
        (
            fields::CATEGORIES,
            req.filter_categories.iter().map(|c| c.name.as_str()).collect(),
        ),
        (
            fields::LANGUAGE,
            req.filter_languages.iter().map(|l| l.name.as_str()).collect(),
        ),
    ];
    for (field, values) in dimensions {
        if let Some(clause) = any_value(field, &values) {
            must.push(clause);
        }
    }

    if let Some(range) = time_clause(&req.filter_time)? {
        must.push(range);
    }

    let request = SearchRequest::new(size).sorted_desc(fields::DATE_PUBLISHED);
    Ok(if must.is_empty() {
        request
    } else {
        request.with_query(Query::all_of(must))
    })
}

/// Exact: every token in name, or every token in description.
/// Fuzzy: every token fuzzily in name, or every token fuzzily in description.
fn string_clause(s: &SearchString) -> Option<Query> {
    let text = s.search.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    let branches = if s.is_exact {
        vec![
            Query::match_all_tokens(fields::NAME, text.clone()),
            Query::match_all_tokens(fields::DESCRIPTION, text),
        ]
    } else {
        let words: Vec<&str> = text.split_whitespace().collect();
        [fields::NAME, fields::DESCRIPTION]
            .into_iter()
            .map(|field| Query::all_of(words.iter().map(|w| Query::fuzzy(field, *w)).collect()))
            .collect()
    };
    Some(Query::any_of(branches))
}

/// One OR-group per dimension; blank values are ignored.
fn any_value(field: &str, values: &[&str]) -> Option<Query> {
    let clauses: Vec<Query> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| Query::match_field(field, v))
        .collect();
    (!clauses.is_empty()).then(|| Query::any_of(clauses))
}

fn time_clause(t: &SearchTime) -> Result<Option<Query>, SearchError> {
    if t.is_empty() {
        return Ok(None);
    }
    let gte = parse_bound(&t.start, NaiveTime::default())?;
    let lte = parse_bound(&t.end, end_of_day())?;
    if let (Some(lo), Some(hi)) = (gte, lte) {
        if lo > hi {
            return Err(SearchError::InvalidFilter(format!(
                "filterTime start {} is after end {}",
                t.start.trim(),
                t.end.trim()
            )));
        }
    }
    Ok(Some(Query::Range {
        field: fields::DATE_PUBLISHED.to_string(),
        gte: gte.map(|d| d.to_rfc3339()),
        lte: lte.map(|d| d.to_rfc3339()),
    }))
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or_default()
}

/// RFC 3339 or `YYYY-MM-DD` (whole day, UTC). Blank is an open bound.
fn parse_bound(raw: &str, day_time: NaiveTime) -> Result<Option<DateTime<Utc>>, SearchError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| Some(d.and_time(day_time).and_utc()))
        .map_err(|_| SearchError::InvalidFilter(format!("filterTime bound `{s}` is not a date")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::{SearchCountry, SearchPerson, SearchPublisher};
    use serde_json::json;

    #[test]
    fn page_size_defaults() {
        assert_eq!(parse_page_size(None), 150);
        assert_eq!(parse_page_size(Some("abc")), 150);
        assert_eq!(parse_page_size(Some("0")), 150);
        assert_eq!(parse_page_size(Some(" 25 ")), 25);
    }

    #[test]
    fn empty_request_is_unconstrained_newest_first() {
        let req = compile(&GrandFilterRequest::default(), 150).unwrap();
        assert!(req.query.is_none());
        assert_eq!(req.to_json()["sort"][0]["datePublished"]["order"], "desc");
    }

    #[test]
    fn people_get_their_own_group() {
        let req = GrandFilterRequest {
            filter_publishers: vec![SearchPublisher { name: "NYT".into() }],
            filter_people: vec![SearchPerson { full_name: "Jane Doe".into() }],
            ..GrandFilterRequest::default()
        };
        let q = compile(&req, 10).unwrap().query.unwrap().to_json();
        let must = q["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["bool"]["should"].as_array().unwrap().len(), 1);
        assert_eq!(
            must[1]["bool"]["should"][0],
            json!({ "match": { "people.fullName": { "query": "Jane Doe", "operator": "or" } } })
        );
    }

    #[test]
    fn fuzzy_string_requires_every_word_per_field() {
        let req = GrandFilterRequest {
            filter_strings: vec![SearchString {
                search: "Ron  DeSantis".into(),
                is_exact: false,
            }],
            ..GrandFilterRequest::default()
        };
        let q = compile(&req, 10).unwrap().query.unwrap().to_json();
        let name_branch = &q["bool"]["must"][0]["bool"]["should"][0]["bool"]["must"];
        assert_eq!(name_branch.as_array().unwrap().len(), 2);
        assert_eq!(name_branch[1]["fuzzy"]["name"]["value"], "desantis");
    }

    #[test]
    fn blank_values_add_no_clause() {
        let req = GrandFilterRequest {
            filter_country: vec![SearchCountry { country: "  ".into() }],
            filter_strings: vec![SearchString::default()],
            ..GrandFilterRequest::default()
        };
        assert!(compile(&req, 10).unwrap().query.is_none());
    }

    #[test]
    fn time_bounds() {
        let day = GrandFilterRequest {
            filter_time: SearchTime {
                start: "2024-01-01".into(),
                end: "2024-01-31".into(),
            },
            ..GrandFilterRequest::default()
        };
        let q = compile(&day, 10).unwrap().query.unwrap().to_json();
        let range = &q["bool"]["must"][0]["range"]["datePublished"];
        assert_eq!(range["gte"], "2024-01-01T00:00:00+00:00");
        assert_eq!(range["lte"], "2024-01-31T23:59:59.999+00:00");

        let bad = GrandFilterRequest {
            filter_time: SearchTime {
                start: "last week".into(),
                end: String::new(),
            },
            ..GrandFilterRequest::default()
        };
        assert!(matches!(compile(&bad, 10), Err(SearchError::InvalidFilter(_))));
    }
}
