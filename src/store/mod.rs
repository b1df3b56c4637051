//! The external structured store: dedup queries and record creation.

pub mod dedup;
pub mod notion;
pub mod record;

pub use dedup::is_duplicate;
pub use notion::NotionStore;
pub use record::{format_record, FormatOptions, PublishedRecord, RecordInput};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Number of records whose URL property is exactly `url`.
    async fn find_by_url(&self, url: &str) -> Result<usize, StoreError>;

    /// Create one record in a single request.
    async fn create(&self, record: &PublishedRecord) -> Result<(), StoreError>;
}
