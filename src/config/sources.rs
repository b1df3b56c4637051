// src/config/sources.rs
use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::SourceDescriptor;

pub const ENV_SOURCES_PATH: &str = "FEED_SOURCES_PATH";

/// Built-in sources used when no sources file is found.
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        // Startup / OSS first-hand chatter
        SourceDescriptor::new("Hacker News", "https://news.ycombinator.com/rss", 3),
        // OS, security, infrastructure, hardware
        SourceDescriptor::new(
            "Ars Technica",
            "https://feeds.arstechnica.com/arstechnica/index",
            3,
        ),
        // Funding rounds and company news
        SourceDescriptor::new("TechCrunch", "https://techcrunch.com/feed/", 3),
        // Research and AI
        SourceDescriptor::new(
            "MIT Technology Review",
            "https://www.technologyreview.com/topnews.rss",
            3,
        ),
        // Ops, cloud, enterprise IT
        SourceDescriptor::new(
            "The Register",
            "https://www.theregister.com/headlines.atom",
            3,
        ),
    ]
}

/// Load sources from an explicit path. Supports TOML (`[[sources]]`) or JSON (array).
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceDescriptor>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let sources = parse_sources(&content, ext.as_str())
        .with_context(|| format!("parsing sources in {}", path.display()))?;
    validate(sources)
}

/// Resolve the source list:
/// 1) `explicit` (CLI flag)
/// 2) $FEED_SOURCES_PATH
/// 3) config/sources.toml
/// 4) config/sources.json
/// 5) built-in defaults
pub fn load_sources(explicit: Option<&Path>) -> Result<Vec<SourceDescriptor>> {
    if let Some(p) = explicit {
        if !p.exists() {
            bail!("sources file {} does not exist", p.display());
        }
        return load_sources_from(p);
    }
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        }
        return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(default_sources())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SourceDescriptor>> {
    match hint_ext {
        "toml" => parse_toml(s),
        "json" => parse_json(s),
        _ => parse_json(s)
            .or_else(|_| parse_toml(s))
            .map_err(|_| anyhow!("unsupported sources format")),
    }
}

fn parse_toml(s: &str) -> Result<Vec<SourceDescriptor>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<SourceDescriptor>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(v.sources)
}

fn parse_json(s: &str) -> Result<Vec<SourceDescriptor>> {
    Ok(serde_json::from_str(s)?)
}

fn validate(items: Vec<SourceDescriptor>) -> Result<Vec<SourceDescriptor>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, mut s)| {
            s.name = s.name.trim().to_string();
            s.url = s.url.trim().to_string();
            if s.name.is_empty() || s.url.is_empty() {
                bail!("source #{} needs both a name and a url", i + 1);
            }
            if s.limit == 0 {
                bail!("source {:?} has limit 0; limit must be positive", s.name);
            }
            Ok(s)
        })
        .collect()
}
