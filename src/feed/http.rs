// src/feed/http.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::{parse::parse_feed, FeedSource};
use crate::config::FeedConfig;
use crate::model::RawEntry;

/// Fetches feeds over HTTP with `reqwest` and parses them in-process.
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(cfg: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn parse(&self, url: &str) -> Result<Vec<RawEntry>> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .context("feed http get()")?
            .error_for_status()
            .context("feed http non-2xx")?
            .text()
            .await
            .context("feed http .text()")?;
        parse_feed(&body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
