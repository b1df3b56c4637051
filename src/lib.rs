// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod store;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::ingest::types::{CandidateItem, FeedError, FeedReader, SourceDescriptor};
pub use crate::pipeline::{ItemOutcome, Pipeline, PipelineConfig, RunStats, Stage};
pub use crate::store::{PublishedRecord, RecordStore, StoreError};
pub use crate::translate::{TranslateError, Translator};
