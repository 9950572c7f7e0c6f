use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process. Only the first call
    /// can succeed; later calls return an error.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "news_terms_fetched_total",
            "Search terms dispatched to the feed source."
        );
        describe_counter!(
            "news_fetch_failures_total",
            "Term fetches that failed, timed out or panicked."
        );
        describe_counter!("news_feed_entries_total", "Entries parsed from feeds.");
        describe_counter!(
            "news_records_accepted_total",
            "Entries kept after timestamp and window filtering."
        );
        describe_counter!(
            "news_entries_rejected_total",
            "Entries dropped, labelled by reason."
        );
        describe_histogram!("news_feed_parse_ms", "Feed parse time in milliseconds.");
        describe_histogram!(
            "news_aggregate_duration_ms",
            "Wall time of one multi-term query in milliseconds."
        );
    });
}
