// src/config/news.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

pub const DEFAULT_NEWS_CONFIG_PATH: &str = "config/news.toml";

pub const ENV_NEWS_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
pub const ENV_DEFAULT_KEYWORD: &str = "NEWS_DEFAULT_KEYWORD";
pub const ENV_WORKER_TIMEOUT_SECS: &str = "NEWS_WORKER_TIMEOUT_SECS";
pub const ENV_METRICS: &str = "NEWS_METRICS";

/// Top-level service configuration. Every field has a default, so a partial
/// TOML file (or none at all) is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Keyword used when a request does not name one.
    pub default_keyword: String,
    /// Length of the fallback window `[today - N days, today]`.
    pub default_window_days: u32,
    /// Per-term fetch budget. `None` (or 0) waits indefinitely.
    pub worker_timeout_secs: Option<u64>,
    pub feed: FeedConfig,
    pub server: ServerConfig,
}

/// Feed search endpoint and locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub search_url: String,
    /// Interface language, e.g. "zh-TW".
    pub hl: String,
    /// Region, e.g. "TW".
    pub gl: String,
    /// Combined edition id, e.g. "TW:zh-Hant".
    pub ceid: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory holding `index.html` and the UI assets.
    pub static_dir: PathBuf,
    pub metrics_enabled: bool,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            default_keyword: "Taiwan".to_string(),
            default_window_days: 7,
            worker_timeout_secs: None,
            feed: FeedConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            search_url: "https://news.google.com/rss/search".to_string(),
            hl: "zh-TW".to_string(),
            gl: "TW".to_string(),
            ceid: "TW:zh-Hant".to_string(),
            http_timeout_secs: 15,
            user_agent: concat!("news-radar/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("frontend"),
            metrics_enabled: false,
        }
    }
}

impl NewsConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading news config from {}", path.display()))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("parsing news config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: NewsConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    /// Resolve configuration:
    /// 1) $NEWS_CONFIG_PATH (must exist when set)
    /// 2) config/news.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied on top.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_NEWS_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("NEWS_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_NEWS_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_NEWS_CONFIG_PATH)?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(k) = env::var(ENV_DEFAULT_KEYWORD) {
            if !k.trim().is_empty() {
                self.default_keyword = k.trim().to_string();
            }
        }
        if let Ok(raw) = env::var(ENV_WORKER_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.worker_timeout_secs = Some(secs),
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid NEWS_WORKER_TIMEOUT_SECS"),
            }
        }
        if let Ok(v) = env::var(ENV_METRICS) {
            self.server.metrics_enabled = v.trim() == "1";
        }
        self.sanitized()
    }

    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }

    fn sanitized(mut self) -> Self {
        if self.default_window_days == 0 {
            self.default_window_days = 7;
        }
        if self.feed.http_timeout_secs == 0 {
            self.feed.http_timeout_secs = FeedConfig::default().http_timeout_secs;
        }
        self
    }
}
