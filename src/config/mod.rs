// src/config/mod.rs
pub mod news;

pub use news::{FeedConfig, NewsConfig, ServerConfig};
