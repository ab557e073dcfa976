// src/ingest/parser.rs
//! RSS 2.0 and Atom payloads -> `FeedItem`s (quick-xml serde).

use chrono::{DateTime, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::normalize_text;
use super::types::FeedItem;
use crate::error::FetchError;

// quick-xml matches elements by local name, so `<atom:link>`, `<media:title>`
// and `<media:description>` land in the same field as their unprefixed
// counterparts. Those fields are lists; the first non-empty value wins.

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    /// `<language>` and `<dc:language>`.
    #[serde(default)]
    language: Vec<String>,
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(default)]
    link: Vec<LinkNode>,
    #[serde(default)]
    description: Vec<TextNode>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    /// `<dc:date>`
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    author: Vec<String>,
    /// `<dc:creator>`
    #[serde(default)]
    creator: Vec<String>,
    #[serde(default)]
    category: Vec<TextNode>,
}

/// Element whose attributes are ignored; only the text is kept.
#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

/// `<link>url</link>` or `<atom:link href=".." rel=".."/>`.
#[derive(Debug, Default, Deserialize)]
struct LinkNode {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

impl LinkNode {
    fn alternate(&self) -> bool {
        self.rel.as_deref().map_or(true, |r| r == "alternate")
    }
}

fn first_text(nodes: Vec<TextNode>) -> String {
    nodes
        .into_iter()
        .map(|n| n.value)
        .find(|v| !v.trim().is_empty())
        .unwrap_or_default()
}

/// Text links first, then alternate hrefs, then the rest; blanks and
/// duplicates dropped.
fn rss_links(nodes: Vec<LinkNode>) -> Vec<String> {
    let mut ranked: Vec<(u8, String)> = nodes
        .into_iter()
        .filter_map(|n| {
            let text = n.value.trim();
            if !text.is_empty() {
                return Some((0, text.to_string()));
            }
            let href = n.href.trim();
            (!href.is_empty()).then(|| (if n.alternate() { 1 } else { 2 }, href.to_string()))
        })
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    let mut out: Vec<String> = Vec::new();
    for (_, link) in ranked {
        if !out.contains(&link) {
            out.push(link);
        }
    }
    out
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "@lang", alias = "@xml:lang", default)]
    lang: Option<String>,
    #[serde(default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(default)]
    summary: Vec<TextNode>,
    #[serde(default)]
    content: Vec<TextNode>,
    #[serde(default)]
    link: Vec<LinkNode>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(default)]
    author: Vec<AtomPerson>,
    #[serde(default)]
    category: Vec<AtomCategory>,
}

#[derive(Debug, Deserialize)]
struct AtomPerson {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term", default)]
    term: String,
}

/// Parse a syndication payload; the root element picks the format.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, FetchError> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);
    let items = match root_element(&xml_clean)?.as_str() {
        "rss" => parse_rss(&xml_clean)?,
        "feed" => parse_atom(&xml_clean)?,
        other => return Err(FetchError::Parse(format!("unsupported feed root <{other}>"))),
    };
    histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(items)
}

fn root_element(xml: &str) -> Result<String, FetchError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(FetchError::Parse("empty document".into())),
            Ok(_) => {}
            Err(e) => return Err(FetchError::Parse(e.to_string())),
        }
    }
}

fn parse_rss(xml: &str) -> Result<Vec<FeedItem>, FetchError> {
    let rss: Rss = from_str(xml).map_err(|e| FetchError::Parse(format!("rss: {e}")))?;
    let language = rss
        .channel
        .language
        .into_iter()
        .map(|l| l.trim().to_string())
        .find(|l| !l.is_empty());

    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| {
            let links = rss_links(it.link);
            let mut authors = Vec::new();
            for raw in it.author.iter().chain(it.creator.iter()) {
                if let Some(name) = author_name(raw) {
                    if !authors.contains(&name) {
                        authors.push(name);
                    }
                }
            }
            FeedItem {
                title: normalize_text(&first_text(it.title)),
                description: normalize_text(&first_text(it.description)),
                link: links.first().cloned().unwrap_or_default(),
                links,
                authors,
                categories: clean_list(it.category.into_iter().map(|c| c.value)),
                published: it
                    .pub_date
                    .as_deref()
                    .and_then(parse_date)
                    .or_else(|| it.date.as_deref().and_then(parse_date)),
                language: language.clone(),
            }
        })
        .collect())
}

fn parse_atom(xml: &str) -> Result<Vec<FeedItem>, FetchError> {
    let feed: AtomFeed = from_str(xml).map_err(|e| FetchError::Parse(format!("atom: {e}")))?;
    let language = feed
        .lang
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    Ok(feed
        .entry
        .into_iter()
        .map(|e| {
            // alternate links first
            let mut links: Vec<(bool, String)> = e
                .link
                .into_iter()
                .filter(|l| !l.href.trim().is_empty())
                .map(|l| (l.alternate(), l.href.trim().to_string()))
                .collect();
            links.sort_by_key(|(alternate, _)| !*alternate);
            let links: Vec<String> = links.into_iter().map(|(_, href)| href).collect();

            let summary = first_text(e.summary);
            let body = if summary.trim().is_empty() {
                first_text(e.content)
            } else {
                summary
            };

            FeedItem {
                title: normalize_text(&first_text(e.title)),
                description: normalize_text(&body),
                link: links.first().cloned().unwrap_or_default(),
                links,
                authors: clean_list(e.author.into_iter().filter_map(|a| a.name)),
                categories: clean_list(e.category.into_iter().map(|c| c.term)),
                published: e
                    .published
                    .as_deref()
                    .and_then(parse_date)
                    .or_else(|| e.updated.as_deref().and_then(parse_date)),
                language: language.clone(),
            }
        })
        .collect())
}

/// RFC 2822 (`time`, then `chrono`) or RFC 3339.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond());
    }
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// `"mail@example.com (Jane Doe)"` -> `Jane Doe`; a bare address carries no name.
pub fn author_name(raw: &str) -> Option<String> {
    let s = normalize_text(raw);
    let name = match (s.find('('), s.rfind(')')) {
        (Some(open), Some(close)) if open < close => s[open + 1..close].trim().to_string(),
        _ if s.contains('@') && !s.contains(' ') => String::new(),
        _ => s,
    };
    (!name.is_empty()).then_some(name)
}

fn clean_list(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for it in items {
        let t = normalize_text(&it);
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// HTML entities that are not predefined in XML would fail the parse.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_forms() {
        assert_eq!(author_name("jd@example.com (Jane Doe)").as_deref(), Some("Jane Doe"));
        assert_eq!(author_name(" Jane  Doe ").as_deref(), Some("Jane Doe"));
        assert_eq!(author_name("jd@example.com"), None);
        assert_eq!(author_name("  "), None);
    }

    #[test]
    fn dates_in_both_formats() {
        let a = parse_date("Tue, 02 Jan 2024 15:04:05 +0000").unwrap();
        let b = parse_date("2024-01-02T15:04:05Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn unknown_root_is_a_parse_error() {
        let err = parse_feed("<html><body/></html>").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
