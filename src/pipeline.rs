//! # Pipeline Driver
//! Walks the configured sources in order, and each source's items in feed order:
//! URL check → dedup gate → translate (with fallback) → format → publish.
//!
//! Containment: a failing source never stops the other sources, and a failing
//! item never stops the rest of its source. Each item ends in exactly one
//! [`ItemOutcome`]; [`RunStats`] is the fold of those outcomes. Nothing is
//! retried within a run.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use metrics::{counter, gauge};

use crate::config::AppConfig;
use crate::ingest::fetch_source;
use crate::ingest::types::{CandidateItem, FeedReader, SourceDescriptor};
use crate::store::record::{local_today, published_date};
use crate::store::{format_record, is_duplicate, FormatOptions, RecordInput, RecordStore};
use crate::translate::{translate_or_original, Translator};

/// Title used when a feed entry has none.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_lang: String,
    pub target_lang: String,
    pub format: FormatOptions,
    /// Courtesy pause after each successful publish.
    pub publish_delay: Duration,
}

impl PipelineConfig {
    pub fn from_app(cfg: &AppConfig) -> Self {
        Self {
            source_lang: cfg.source_lang.clone(),
            target_lang: cfg.target_lang.clone(),
            format: FormatOptions {
                with_summary: cfg.write_summary,
            },
            publish_delay: cfg.publish_delay,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_lang: "EN".into(),
            target_lang: "JA".into(),
            format: FormatOptions::default(),
            publish_delay: Duration::from_millis(400),
        }
    }
}

/// Stage at which an item was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dedup,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Dedup => f.write_str("dedup"),
            Stage::Publish => f.write_str("publish"),
        }
    }
}

/// Terminal state of one candidate item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// No URL; dropped before any lookup.
    Discarded,
    /// URL already in the store.
    Skipped,
    /// Record created; `fallback` is true when the original title stood in for
    /// a failed translation.
    Published { fallback: bool },
    Failed { stage: Stage, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub posted: usize,
    pub skipped: usize,
    /// Dedup-query or publish failures.
    pub failed: usize,
    pub discarded: usize,
    pub translation_fallbacks: usize,
    pub sources_failed: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Discarded => {
                self.discarded += 1;
                counter!("relay_discarded_total").increment(1);
            }
            ItemOutcome::Skipped => {
                self.skipped += 1;
                counter!("relay_skipped_total").increment(1);
            }
            ItemOutcome::Published { fallback } => {
                self.posted += 1;
                counter!("relay_posted_total").increment(1);
                if *fallback {
                    self.translation_fallbacks += 1;
                    counter!("translation_fallback_total").increment(1);
                }
            }
            ItemOutcome::Failed { .. } => {
                self.failed += 1;
                counter!("relay_failed_total").increment(1);
            }
        }
    }

    /// True when any item or source was lost to an error.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.sources_failed > 0
    }

    /// Process exit status: 0 unless `fail_on_errors` is set and something failed.
    pub fn exit_status(&self, fail_on_errors: bool) -> u8 {
        u8::from(fail_on_errors && self.has_failures())
    }
}

pub struct Pipeline<'a> {
    reader: &'a dyn FeedReader,
    translator: &'a dyn Translator,
    store: &'a dyn RecordStore,
    cfg: PipelineConfig,
    today: NaiveDate,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        reader: &'a dyn FeedReader,
        translator: &'a dyn Translator,
        store: &'a dyn RecordStore,
        cfg: PipelineConfig,
    ) -> Self {
        Self {
            reader,
            translator,
            store,
            cfg,
            today: local_today(),
        }
    }

    /// Date used for items whose feed gave no timestamp.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Process every source, then return the totals.
    pub async fn run(&self, sources: &[SourceDescriptor]) -> RunStats {
        crate::metrics::ensure_metrics_described();

        let mut stats = RunStats::default();
        for source in sources {
            self.run_source(source, &mut stats).await;
        }

        gauge!("relay_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        tracing::info!(
            posted = stats.posted,
            skipped = stats.skipped,
            failed = stats.failed,
            discarded = stats.discarded,
            fallbacks = stats.translation_fallbacks,
            sources_failed = stats.sources_failed,
            "run finished"
        );
        stats
    }

    async fn run_source(&self, source: &SourceDescriptor, stats: &mut RunStats) {
        tracing::info!(source = %source.name, url = %source.url, "fetching feed");

        let items = match fetch_source(self.reader, source).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, source = %source.name, "feed failed; skipping source");
                counter!("feed_source_errors_total").increment(1);
                stats.sources_failed += 1;
                return;
            }
        };

        for item in &items {
            let outcome = self.process_item(&source.name, item).await;
            stats.record(&outcome);

            if matches!(outcome, ItemOutcome::Published { .. }) && !self.cfg.publish_delay.is_zero()
            {
                tokio::time::sleep(self.cfg.publish_delay).await;
            }
        }
    }

    /// Drive one item to its terminal state. Never panics on external failures.
    pub async fn process_item(&self, source_name: &str, item: &CandidateItem) -> ItemOutcome {
        let url = item.url.trim();
        if url.is_empty() {
            tracing::debug!(source = %source_name, title = %item.title, "entry has no url; discarded");
            return ItemOutcome::Discarded;
        }

        match is_duplicate(self.store, url).await {
            Ok(true) => {
                tracing::debug!(source = %source_name, url, "already stored");
                return ItemOutcome::Skipped;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, source = %source_name, url, "dedup check failed; item skipped");
                return ItemOutcome::Failed {
                    stage: Stage::Dedup,
                    reason: e.to_string(),
                };
            }
        }

        let title = match item.title.trim() {
            "" => UNTITLED,
            t => t,
        };

        let (translation, err) = translate_or_original(
            self.translator,
            title,
            &self.cfg.source_lang,
            &self.cfg.target_lang,
        )
        .await;
        let fallback = match err {
            None => {
                tracing::info!(source = %source_name, original = %translation.original, translated = %translation.translated, "translated");
                false
            }
            Some(e) => {
                tracing::warn!(error = %e, source = %source_name, original = %title, "translation failed; using original title");
                true
            }
        };

        let record = format_record(
            &RecordInput {
                original_title: &translation.original,
                translated_title: &translation.translated,
                url,
                source: source_name,
                published: published_date(item.published, self.today),
            },
            &self.cfg.format,
        );

        match self.store.create(&record).await {
            Ok(()) => {
                tracing::info!(source = %source_name, url, title = %record.title, "posted");
                ItemOutcome::Published { fallback }
            }
            Err(e) => {
                tracing::warn!(error = %e, source = %source_name, url, "publish failed; item skipped");
                ItemOutcome::Failed {
                    stage: Stage::Publish,
                    reason: e.to_string(),
                }
            }
        }
    }
}
