use std::path::Path;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series carry help text in the exposition).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "Entries parsed from feeds.");
        describe_counter!(
            "feed_source_errors_total",
            "Sources skipped because fetch or parse failed."
        );
        describe_counter!("relay_posted_total", "Records created in the store.");
        describe_counter!(
            "relay_skipped_total",
            "Items skipped because their URL was already stored."
        );
        describe_counter!(
            "relay_failed_total",
            "Items dropped after a dedup-query or publish failure."
        );
        describe_counter!("relay_discarded_total", "Items without a URL.");
        describe_counter!(
            "translation_fallback_total",
            "Items published with their original title after translation failed."
        );
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("relay_last_run_ts", "Unix ts when the relay last finished a run.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder globally. Call at most once per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Write the exposition text to `path` (node-exporter textfile collector style:
    /// write a sibling temp file, then rename over the target).
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.handle.render())
            .with_context(|| format!("writing metrics to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("renaming metrics file to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textfile_is_written_and_temp_file_removed() {
        // A local recorder; nothing is installed globally.
        let recorder = PrometheusBuilder::new().build_recorder();
        let m = Metrics {
            handle: recorder.handle(),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed_relay.prom");

        m.write_textfile(&path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("prom.tmp").exists());
    }
}
