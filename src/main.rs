//! feed-relay: binary entrypoint.
//! Reads configuration, wires the HTTP-backed components and runs the pipeline once.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_relay::config::{sources::load_sources, AppConfig};
use feed_relay::ingest::http::HttpFeedReader;
use feed_relay::metrics::Metrics;
use feed_relay::store::NotionStore;
use feed_relay::translate::DeeplTranslator;
use feed_relay::{Pipeline, PipelineConfig};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Sources file (TOML or JSON); overrides $FEED_SOURCES_PATH and config/.
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Pause after each successful publish, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Exit with status 1 if any item or source failed.
    #[arg(long)]
    fail_on_errors: bool,
}

/// Logs go to stderr so stdout only carries the run report.
/// `LOG_FORMAT=json` switches to JSON lines; `RUST_LOG` overrides the filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feed_relay=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Load .env when present; real environment wins.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let cfg = AppConfig::from_env()?.with_delay_override(cli.delay_ms);
    tracing::debug!(config = ?cfg, "configuration loaded");

    let sources = load_sources(cli.sources.as_deref()).context("loading sources")?;

    let metrics = match &cfg.metrics_textfile {
        Some(_) => Some(Metrics::init()?),
        None => None,
    };

    let reader = HttpFeedReader::new()?;
    let translator = DeeplTranslator::new(&cfg.deepl_api_key, cfg.deepl_endpoint.as_deref())?;
    let store = NotionStore::new(
        &cfg.notion_token,
        &cfg.notion_database_id,
        cfg.notion_api_base.as_deref(),
    )?;

    let pipeline = Pipeline::new(&reader, &translator, &store, PipelineConfig::from_app(&cfg));
    let stats = pipeline.run(&sources).await;

    if let (Some(m), Some(path)) = (&metrics, &cfg.metrics_textfile) {
        if let Err(e) = m.write_textfile(path) {
            tracing::warn!(error = ?e, "metrics textfile not written");
        }
    }

    println!("\nOK: posted={}, skipped={}", stats.posted, stats.skipped);
    println!(
        "   failed={}, discarded={}, translation_fallbacks={}, sources_failed={}",
        stats.failed, stats.discarded, stats.translation_fallbacks, stats.sources_failed
    );

    Ok(ExitCode::from(stats.exit_status(cli.fail_on_errors)))
}
