use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};

use crate::aggregate::{Aggregate, Aggregator};
use crate::config::NewsConfig;
use crate::feed::{FeedSource, HttpFeedSource};
use crate::model::{CombinationMode, DateWindow, NewsRecord, SearchTerm};
use crate::stats::SourceStats;
use crate::worker::{FeedUrlTemplate, FetchWorker};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub config: Arc<NewsConfig>,
}

impl AppState {
    /// Wire an aggregator over `source` using the feed and timeout settings in `config`.
    pub fn new(source: Arc<dyn FeedSource>, config: NewsConfig) -> Self {
        let worker = FetchWorker::new(source, FeedUrlTemplate::from_config(&config.feed));
        let aggregator = Aggregator::new(worker).with_worker_timeout(config.worker_timeout());
        Self {
            aggregator: Arc::new(aggregator),
            config: Arc::new(config),
        }
    }

    /// Production wiring: feeds are fetched over HTTP.
    pub fn from_config(config: NewsConfig) -> Result<Self> {
        let source = HttpFeedSource::new(&config.feed)?;
        Ok(Self::new(Arc::new(source), config))
    }
}

pub fn router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/news", get(get_news))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub keyword: Option<String>,
    pub logic: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<NewsRecord>,
    pub stats: SourceStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partial_failures: Vec<SearchTerm>,
}

impl From<Aggregate> for NewsResponse {
    fn from(agg: Aggregate) -> Self {
        Self {
            success: true,
            count: agg.records.len(),
            data: agg.records,
            stats: agg.stats,
            partial_failures: agg.failed_terms,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(m) | Self::Internal(m) => f.write_str(m),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn get_news(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Result<Json<NewsResponse>, ApiError> {
    let keyword = q
        .keyword
        .unwrap_or_else(|| state.config.default_keyword.clone());
    let mode = parse_logic(q.logic.as_deref())?;
    let today = Local::now().date_naive();
    let window = resolve_window(
        q.start_date.as_deref(),
        q.end_date.as_deref(),
        today,
        state.config.default_window_days,
    )?;

    tracing::debug!(keyword = %keyword, mode = %mode, start = %window.start, end = %window.end, "news query");

    // A panic inside the aggregation becomes a 500 envelope instead of a dropped connection.
    let aggregator = Arc::clone(&state.aggregator);
    let agg = tokio::spawn(async move { aggregator.aggregate(&keyword, window, mode).await })
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "news aggregation task failed");
            ApiError::Internal(format!("aggregation failed: {e}"))
        })?;

    Ok(Json(NewsResponse::from(agg)))
}

fn parse_logic(raw: Option<&str>) -> Result<CombinationMode, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(CombinationMode::default()),
        Some(s) => s
            .parse::<CombinationMode>()
            .map_err(|e| ApiError::BadRequest(e.to_string())),
    }
}

/// Both dates given → that window (validated). Otherwise the last
/// `default_days` days ending `today`.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
    default_days: u32,
) -> Result<DateWindow, ApiError> {
    fn non_blank(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }

    match (non_blank(start), non_blank(end)) {
        (Some(s), Some(e)) => {
            let start = parse_date("start_date", s)?;
            let end = parse_date("end_date", e)?;
            if start > end {
                return Err(ApiError::BadRequest(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
            Ok(DateWindow::new(start, end))
        }
        _ => {
            let start = today
                .checked_sub_days(Days::new(u64::from(default_days)))
                .unwrap_or(NaiveDate::MIN);
            Ok(DateWindow::new(start, today))
        }
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        ApiError::BadRequest(format!("invalid {field} '{raw}', expected YYYY-MM-DD"))
    })
}
