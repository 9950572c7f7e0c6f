// src/feed/fixture.rs
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{parse::parse_feed, FeedSource};
use crate::model::RawEntry;

enum Canned {
    Xml(String),
    Entries(Vec<RawEntry>),
    Failure(String),
}

/// In-memory feed source keyed by URL. Unknown URLs answer with an empty feed.
/// Every requested URL is recorded, in call order.
#[derive(Default)]
pub struct FixtureFeedSource {
    feeds: HashMap<String, Canned>,
    delays: HashMap<String, Duration>,
    requested: Mutex<Vec<String>>,
}

impl FixtureFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `xml` (RSS or Atom) for `url`; it goes through the real parser.
    pub fn with_xml(mut self, url: impl Into<String>, xml: impl Into<String>) -> Self {
        self.feeds.insert(url.into(), Canned::Xml(xml.into()));
        self
    }

    pub fn with_entries(mut self, url: impl Into<String>, entries: Vec<RawEntry>) -> Self {
        self.feeds.insert(url.into(), Canned::Entries(entries));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.feeds.insert(url.into(), Canned::Failure(message.into()));
        self
    }

    /// Sleep before answering `url`, to simulate a slow upstream.
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        match self.requested.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl FeedSource for FixtureFeedSource {
    async fn parse(&self, url: &str) -> Result<Vec<RawEntry>> {
        match self.requested.lock() {
            Ok(mut g) => g.push(url.to_string()),
            Err(poisoned) => poisoned.into_inner().push(url.to_string()),
        }

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        match self.feeds.get(url) {
            Some(Canned::Xml(xml)) => parse_feed(xml),
            Some(Canned::Entries(v)) => Ok(v.clone()),
            Some(Canned::Failure(msg)) => Err(anyhow!("{msg}")),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
