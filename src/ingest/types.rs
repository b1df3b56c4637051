// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_limit() -> usize {
    3
}

/// One configured syndication source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Shown in the store's Source property.
    pub name: String,
    #[serde(alias = "rss", alias = "feed_url")]
    pub url: String,
    /// Maximum number of entries taken from the top of the feed.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>, limit: usize) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            limit,
        }
    }
}

/// A feed entry considered for publication in the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub title: String,
    /// Canonical link; the only dedup identity.
    pub url: String,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned HTTP {status}")]
    Status { status: u16 },

    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("feed parse failed: {0}")]
    Parse(String),
}

#[async_trait::async_trait]
pub trait FeedReader: Send + Sync {
    /// Fetch and parse `source`, returning entries in the feed's own order.
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<CandidateItem>, FeedError>;
}
