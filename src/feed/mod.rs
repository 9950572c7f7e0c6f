// src/feed/mod.rs
pub mod fixture;
pub mod http;
pub mod parse;

use anyhow::Result;

use crate::model::RawEntry;

pub use fixture::FixtureFeedSource;
pub use http::HttpFeedSource;
pub use parse::parse_feed;

/// Retrieval of one feed document: given a URL, return its entries or fail.
/// One attempt per call; implementations may block on network I/O.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn parse(&self, url: &str) -> Result<Vec<RawEntry>>;
    fn name(&self) -> &'static str;
}
