// src/ingest/mod.rs
pub mod fetcher;
pub mod harvest;
pub mod ner;
pub mod parser;
pub mod scheduler;
pub mod transform;
pub mod types;

pub use fetcher::HttpFeedFetcher;
pub use harvest::{HarvestMode, HarvestReport, Harvester};
pub use types::{FeedFetcher, FeedItem};

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_histogram!(
            "harvest_duration_seconds",
            "Wall time of one harvest run, observed once per run."
        );
        describe_counter!("harvest_runs_total", "Harvest runs started, by mode.");
        describe_counter!(
            "harvest_sources_failed_total",
            "Sources whose feed could not be fetched or parsed."
        );
        describe_counter!(
            "harvest_items_skipped_total",
            "Feed items dropped by the freshness policy, by reason."
        );
        describe_counter!(
            "harvest_index_failures_total",
            "Document writes that failed or timed out, by kind."
        );
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    let out = re_tags.replace_all(&out, " ");

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}
