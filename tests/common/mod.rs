// tests/common/mod.rs
//
// In-memory doubles for the pipeline's three seams. Each one records what it
// was asked so tests can assert on calls that must (or must not) happen.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use feed_relay::{
    CandidateItem, FeedError, FeedReader, PipelineConfig, PublishedRecord, RecordStore,
    SourceDescriptor, StoreError, TranslateError, Translator,
};

pub fn item(title: &str, url: &str) -> CandidateItem {
    CandidateItem {
        title: title.to_string(),
        url: url.to_string(),
        published: None,
    }
}

pub fn item_at(title: &str, url: &str, ts: DateTime<Utc>) -> CandidateItem {
    CandidateItem {
        published: Some(ts),
        ..item(title, url)
    }
}

pub fn source(name: &str, limit: usize) -> SourceDescriptor {
    SourceDescriptor::new(name, format!("https://feeds.test/{}", name.replace(' ', "-")), limit)
}

/// Pipeline settings without pacing so tests run instantly.
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        publish_delay: Duration::ZERO,
        ..PipelineConfig::default()
    }
}

/// Feed reader keyed by source name. A source mapped to `None` fails to parse;
/// an unknown source fails with HTTP 404.
#[derive(Default)]
pub struct FakeReader {
    feeds: HashMap<String, Option<Vec<CandidateItem>>>,
}

impl FakeReader {
    pub fn with_feed(mut self, name: &str, items: Vec<CandidateItem>) -> Self {
        self.feeds.insert(name.to_string(), Some(items));
        self
    }

    pub fn with_broken(mut self, name: &str) -> Self {
        self.feeds.insert(name.to_string(), None);
        self
    }
}

#[async_trait]
impl FeedReader for FakeReader {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<CandidateItem>, FeedError> {
        match self.feeds.get(&source.name) {
            Some(Some(items)) => Ok(items.clone()),
            Some(None) => Err(FeedError::Parse("unexpected end of document".into())),
            None => Err(FeedError::Status { status: 404 }),
        }
    }
}

/// Translator that prefixes `JA:`; texts listed in `failing` get a 456 response.
#[derive(Default)]
pub struct FakeTranslator {
    failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTranslator {
    pub fn failing_on(texts: &[&str]) -> Self {
        Self {
            failing: texts.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String, TranslateError> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.failing.contains(text) {
            return Err(TranslateError::Status {
                status: 456,
                body: "Quota exceeded".into(),
            });
        }
        Ok(format!("JA:{text}"))
    }
}

/// Translation service that is down for every request.
pub struct AlwaysFailingTranslator;

#[async_trait]
impl Translator for AlwaysFailingTranslator {
    async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslateError> {
        Err(TranslateError::Status {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

/// Store holding created records in memory, with per-URL fault injection.
#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<Vec<PublishedRecord>>,
    pub queries: Mutex<Vec<String>>,
    pub create_calls: Mutex<usize>,
    existing: HashSet<String>,
    fail_query: HashSet<String>,
    fail_create: HashSet<String>,
}

impl MemoryStore {
    /// Store that already holds records for `urls`.
    pub fn seeded(urls: &[&str]) -> Self {
        Self {
            existing: urls.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing_query_for(mut self, url: &str) -> Self {
        self.fail_query.insert(url.to_string());
        self
    }

    pub fn failing_create_for(mut self, url: &str) -> Self {
        self.fail_create.insert(url.to_string());
        self
    }

    pub fn created(&self) -> Vec<PublishedRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn created_for(&self, url: &str) -> Option<PublishedRecord> {
        self.created().into_iter().find(|r| r.url == url)
    }

    pub fn query_log(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_url(&self, url: &str) -> Result<usize, StoreError> {
        self.queries.lock().unwrap().push(url.to_string());
        if self.fail_query.contains(url) {
            return Err(StoreError::Status {
                status: 502,
                body: "bad gateway".into(),
            });
        }
        let seeded = usize::from(self.existing.contains(url));
        let created = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count();
        Ok(seeded + created)
    }

    async fn create(&self, record: &PublishedRecord) -> Result<(), StoreError> {
        *self.create_calls.lock().unwrap() += 1;
        if self.fail_create.contains(&record.url) {
            return Err(StoreError::Status {
                status: 400,
                body: r#"{"object":"error","code":"validation_error"}"#.into(),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
