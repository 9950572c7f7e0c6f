// src/aggregate.rs
//! Concurrent fan-out over search terms and the deterministic merge.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::model::{CombinationMode, DateWindow, NewsRecord, SearchTerm};
use crate::planner;
use crate::stats::SourceStats;
use crate::worker::{FetchWorker, TermFetch};

/// Merged output of one query.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    /// Sorted by `published_at`, newest first.
    pub records: Vec<NewsRecord>,
    pub stats: SourceStats,
    /// Terms whose fetch failed, timed out or panicked, in plan order.
    pub failed_terms: Vec<SearchTerm>,
}

pub struct Aggregator {
    worker: Arc<FetchWorker>,
    worker_timeout: Option<Duration>,
}

impl Aggregator {
    pub fn new(worker: FetchWorker) -> Self {
        Self {
            worker: Arc::new(worker),
            worker_timeout: None,
        }
    }

    /// Bound each term's fetch. A term that runs over contributes nothing.
    pub fn with_worker_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.worker_timeout = timeout;
        self
    }

    pub fn worker(&self) -> &FetchWorker {
        &self.worker
    }

    pub async fn aggregate(
        &self,
        raw_keyword: &str,
        window: DateWindow,
        mode: CombinationMode,
    ) -> Aggregate {
        let t0 = Instant::now();
        let terms = planner::plan(raw_keyword, mode);

        // One task per term, each owning its output until the join.
        let handles: Vec<_> = terms
            .iter()
            .cloned()
            .map(|term| {
                let worker = Arc::clone(&self.worker);
                let timeout = self.worker_timeout;
                tokio::spawn(async move { run_term(worker, term, window, timeout).await })
            })
            .collect();

        // Await in spawn order so the concatenation is term-ordered.
        let mut records = Vec::new();
        let mut failed_terms = Vec::new();
        for (term, handle) in terms.into_iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(term = %term, error = ?e, "fetch task did not complete");
                    counter!("news_fetch_failures_total").increment(1);
                    TermFetch::failed(term, e.to_string())
                }
            };
            if outcome.error.is_some() {
                failed_terms.push(outcome.term);
            }
            records.extend(outcome.records);
        }

        let records = sort_newest_first(records);
        let stats = SourceStats::from_records(&records);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_aggregate_duration_ms").record(ms);
        info!(
            keyword = raw_keyword,
            mode = %mode,
            start = %window.start,
            end = %window.end,
            count = records.len(),
            failed = failed_terms.len(),
            elapsed_ms = ms,
            "aggregate finished"
        );

        Aggregate {
            records,
            stats,
            failed_terms,
        }
    }
}

async fn run_term(
    worker: Arc<FetchWorker>,
    term: SearchTerm,
    window: DateWindow,
    timeout: Option<Duration>,
) -> TermFetch {
    let Some(limit) = timeout else {
        return worker.fetch_outcome(&term, window).await;
    };
    match tokio::time::timeout(limit, worker.fetch_outcome(&term, window)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(term = %term, timeout_ms = limit.as_millis() as u64, "feed fetch timed out");
            counter!("news_fetch_failures_total").increment(1);
            TermFetch::failed(term, format!("timed out after {}ms", limit.as_millis()))
        }
    }
}

/// Stable sort, newest first; equal timestamps keep merge order.
pub fn sort_newest_first(mut records: Vec<NewsRecord>) -> Vec<NewsRecord> {
    records.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    records
}
