// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod model;
pub mod planner;
pub mod stats;
pub mod timestamp;
pub mod worker;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{Aggregate, Aggregator};
pub use crate::api::{router, AppState};
pub use crate::feed::FeedSource;
pub use crate::model::{CombinationMode, DateWindow, NewsRecord, RawEntry, SearchTerm};
pub use crate::stats::SourceStats;
pub use crate::worker::{FeedUrlTemplate, FetchWorker};

use axum::Router;
use once_cell::sync::OnceCell;
use tracing::warn;

use crate::config::NewsConfig;

/// Build the full HTTP app from `config/news.toml` / env, fetching feeds over HTTP.
pub fn app() -> anyhow::Result<Router> {
    let config = NewsConfig::load_default()?;
    let metrics_enabled = config.server.metrics_enabled;
    let state = AppState::from_config(config)?;
    Ok(with_metrics_route(router(state), metrics_enabled))
}

/// Mount `/metrics` when enabled. The Prometheus recorder is process-wide,
/// so it is installed at most once.
pub fn with_metrics_route(router: Router, enabled: bool) -> Router {
    static METRICS: OnceCell<Option<crate::metrics::Metrics>> = OnceCell::new();

    if !enabled {
        return router;
    }
    let installed = METRICS.get_or_init(|| match crate::metrics::Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = ?e, "metrics recorder unavailable, /metrics disabled");
            None
        }
    });
    match installed {
        Some(m) => router.merge(m.router()),
        None => router,
    }
}
