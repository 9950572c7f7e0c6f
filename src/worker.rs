// src/worker.rs
//! Per-term fetch: build the search URL, pull the feed, keep entries inside
//! the date window and normalize them into `NewsRecord`s.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::feed::FeedSource;
use crate::model::{DateWindow, NewsRecord, RawEntry, SearchTerm, UNKNOWN_SOURCE};
use crate::timestamp::parse_feed_timestamp;

/// Search URL layout: `{search_url}?q={term}&hl=..&gl=..&ceid=..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUrlTemplate {
    search_url: String,
    hl: String,
    gl: String,
    ceid: String,
}

impl FeedUrlTemplate {
    pub fn from_config(cfg: &FeedConfig) -> Self {
        Self {
            search_url: cfg.search_url.clone(),
            hl: cfg.hl.clone(),
            gl: cfg.gl.clone(),
            ceid: cfg.ceid.clone(),
        }
    }

    pub fn build(&self, term: &SearchTerm) -> String {
        format!(
            "{}?q={}&hl={}&gl={}&ceid={}",
            self.search_url,
            urlencoding::encode(term.as_str()),
            self.hl,
            self.gl,
            self.ceid
        )
    }
}

impl Default for FeedUrlTemplate {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

/// What one term produced. `error` is set when retrieval or parsing failed,
/// in which case `records` is empty.
#[derive(Debug, Clone)]
pub struct TermFetch {
    pub term: SearchTerm,
    pub records: Vec<NewsRecord>,
    pub error: Option<String>,
}

impl TermFetch {
    pub fn failed(term: SearchTerm, error: impl Into<String>) -> Self {
        Self {
            term,
            records: Vec::new(),
            error: Some(error.into()),
        }
    }
}

pub struct FetchWorker {
    source: Arc<dyn FeedSource>,
    urls: FeedUrlTemplate,
}

impl FetchWorker {
    pub fn new(source: Arc<dyn FeedSource>, urls: FeedUrlTemplate) -> Self {
        Self { source, urls }
    }

    pub fn url_for(&self, term: &SearchTerm) -> String {
        self.urls.build(term)
    }

    /// Records for `term` within `window`, in feed order. Never fails:
    /// a broken feed contributes nothing.
    pub async fn fetch(&self, term: &SearchTerm, window: DateWindow) -> Vec<NewsRecord> {
        self.fetch_outcome(term, window).await.records
    }

    /// Like [`fetch`](Self::fetch) but also reports why a term came back empty.
    pub async fn fetch_outcome(&self, term: &SearchTerm, window: DateWindow) -> TermFetch {
        let url = self.url_for(term);
        counter!("news_terms_fetched_total").increment(1);

        match self.source.parse(&url).await {
            Ok(entries) => {
                let total = entries.len();
                let records = normalize_entries(term, window, entries);
                debug!(
                    term = %term,
                    total,
                    accepted = records.len(),
                    "feed fetched"
                );
                TermFetch {
                    term: term.clone(),
                    records,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    term = %term,
                    url = %url,
                    feed_source = self.source.name(),
                    error = ?e,
                    "feed fetch failed, term contributes no records"
                );
                counter!("news_fetch_failures_total").increment(1);
                TermFetch::failed(term.clone(), format!("{e:#}"))
            }
        }
    }
}

/// Drop entries without a usable timestamp or outside `window` (compared on
/// the UTC date), and map the rest to records. Feed order is kept.
pub fn normalize_entries(
    term: &SearchTerm,
    window: DateWindow,
    entries: Vec<RawEntry>,
) -> Vec<NewsRecord> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(published_at) = entry.published.as_deref().and_then(parse_feed_timestamp) else {
            counter!("news_entries_rejected_total", "reason" => "no_timestamp").increment(1);
            continue;
        };
        if !window.contains(published_at.date_naive()) {
            counter!("news_entries_rejected_total", "reason" => "out_of_window").increment(1);
            continue;
        }
        out.push(NewsRecord {
            title: entry.title.unwrap_or_default(),
            link: entry.link.unwrap_or_default(),
            published_at,
            source: entry
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            matched_term: term.clone(),
        });
    }
    counter!("news_records_accepted_total").increment(out.len() as u64);
    out
}
