// src/ingest/http.rs
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;

use crate::ingest::feed::parse_feed;
use crate::ingest::types::{CandidateItem, FeedError, FeedReader, SourceDescriptor};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const TOTAL_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 5;

/// Upper bound on a feed body; anything larger is refused.
pub const MAX_FEED_BYTES: u64 = 10 * 1024 * 1024;

const USER_AGENT: &str = concat!("feed-relay/", env!("CARGO_PKG_VERSION"));

/// Feed reader that GETs the source URL over HTTP.
pub struct HttpFeedReader {
    client: Client,
}

impl HttpFeedReader {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FeedReader for HttpFeedReader {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<CandidateItem>, FeedError> {
        let mut resp = self.client.get(&source.url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }

        if let Some(len) = resp.content_length() {
            if len > MAX_FEED_BYTES {
                return Err(FeedError::TooLarge {
                    size: len,
                    max: MAX_FEED_BYTES,
                });
            }
        }

        // Chunked bodies carry no length up front; stop as soon as the cap is crossed.
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            let size = (bytes.len() + chunk.len()) as u64;
            if size > MAX_FEED_BYTES {
                return Err(FeedError::TooLarge {
                    size,
                    max: MAX_FEED_BYTES,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&bytes);
        parse_feed(&body)
    }
}
