// src/config/mod.rs
//! Runtime configuration, read once at startup and passed by reference.

pub mod sources;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const ENV_NOTION_TOKEN: &str = "NOTION_TOKEN";
pub const ENV_NOTION_DATABASE_ID: &str = "NOTION_DATABASE_ID";
pub const ENV_DEEPL_API_KEY: &str = "DEEPL_API_KEY";

const DEFAULT_SOURCE_LANG: &str = "EN";
const DEFAULT_TARGET_LANG: &str = "JA";
const DEFAULT_PUBLISH_DELAY_MS: u64 = 400;

#[derive(Clone)]
pub struct AppConfig {
    pub notion_token: String,
    pub notion_database_id: String,
    pub deepl_api_key: String,
    /// Replaces the key-derived DeepL endpoint.
    pub deepl_endpoint: Option<String>,
    pub notion_api_base: Option<String>,
    pub source_lang: String,
    pub target_lang: String,
    /// Write the optional `Summary` property.
    pub write_summary: bool,
    /// Pause after each successful publish.
    pub publish_delay: Duration,
    pub metrics_textfile: Option<PathBuf>,
}

// Secrets never reach logs: only their length is shown.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("notion_token_len", &self.notion_token.len())
            .field("notion_database_id", &self.notion_database_id)
            .field("deepl_api_key_len", &self.deepl_api_key.len())
            .field("deepl_endpoint", &self.deepl_endpoint)
            .field("notion_api_base", &self.notion_api_base)
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("write_summary", &self.write_summary)
            .field("publish_delay", &self.publish_delay)
            .field("metrics_textfile", &self.metrics_textfile)
            .finish()
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => bail!("Missing env var: {name}"),
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Missing or blank credentials are fatal.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let notion_token = require(&lookup, ENV_NOTION_TOKEN)?;
        let notion_database_id = require(&lookup, ENV_NOTION_DATABASE_ID)?;
        let deepl_api_key = require(&lookup, ENV_DEEPL_API_KEY)?;

        let publish_delay_ms = match optional(&lookup, "PUBLISH_DELAY_MS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("PUBLISH_DELAY_MS is not a number: {v}"))?,
            None => DEFAULT_PUBLISH_DELAY_MS,
        };

        Ok(Self {
            notion_token,
            notion_database_id,
            deepl_api_key,
            deepl_endpoint: optional(&lookup, "DEEPL_API_URL"),
            notion_api_base: optional(&lookup, "NOTION_API_BASE"),
            source_lang: optional(&lookup, "DEEPL_SOURCE_LANG")
                .unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_string()),
            target_lang: optional(&lookup, "DEEPL_TARGET_LANG")
                .unwrap_or_else(|| DEFAULT_TARGET_LANG.to_string()),
            write_summary: optional(&lookup, "NOTION_WRITE_SUMMARY")
                .is_some_and(|v| parse_flag(&v)),
            publish_delay: Duration::from_millis(publish_delay_ms),
            metrics_textfile: optional(&lookup, "METRICS_TEXTFILE").map(PathBuf::from),
        })
    }

    /// Apply a command-line delay; it wins over `PUBLISH_DELAY_MS`.
    pub fn with_delay_override(mut self, delay_ms: Option<u64>) -> Self {
        if let Some(ms) = delay_ms {
            self.publish_delay = Duration::from_millis(ms);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    const CREDS: [(&str, &str); 3] = [
        (ENV_NOTION_TOKEN, "secret_abc"),
        (ENV_NOTION_DATABASE_ID, "db123"),
        (ENV_DEEPL_API_KEY, " key:fx "),
    ];

    #[test]
    fn defaults_apply_when_only_credentials_set() {
        let cfg = AppConfig::from_lookup(lookup(&CREDS)).unwrap();
        assert_eq!(cfg.deepl_api_key, "key:fx");
        assert_eq!(cfg.source_lang, "EN");
        assert_eq!(cfg.target_lang, "JA");
        assert_eq!(cfg.publish_delay, Duration::from_millis(400));
        assert!(!cfg.write_summary);
        assert!(cfg.deepl_endpoint.is_none());
    }

    #[test]
    fn each_missing_credential_is_named() {
        for skip in [ENV_NOTION_TOKEN, ENV_NOTION_DATABASE_ID, ENV_DEEPL_API_KEY] {
            let pairs: Vec<_> = CREDS.iter().copied().filter(|(k, _)| *k != skip).collect();
            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert_eq!(err.to_string(), format!("Missing env var: {skip}"));
        }
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let mut pairs = CREDS.to_vec();
        pairs[0] = (ENV_NOTION_TOKEN, "   ");
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn optional_settings_are_read() {
        let mut pairs = CREDS.to_vec();
        pairs.extend([
            ("PUBLISH_DELAY_MS", "0"),
            ("NOTION_WRITE_SUMMARY", "true"),
            ("DEEPL_TARGET_LANG", "DE"),
            ("METRICS_TEXTFILE", "/tmp/relay.prom"),
        ]);
        let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.publish_delay, Duration::ZERO);
        assert!(cfg.write_summary);
        assert_eq!(cfg.target_lang, "DE");
        assert_eq!(cfg.metrics_textfile, Some(PathBuf::from("/tmp/relay.prom")));
    }

    #[test]
    fn cli_delay_overrides_env() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("PUBLISH_DELAY_MS", "900"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();

        let kept = cfg.clone().with_delay_override(None);
        assert_eq!(kept.publish_delay, Duration::from_millis(900));
        let zeroed = cfg.with_delay_override(Some(0));
        assert_eq!(zeroed.publish_delay, Duration::ZERO);
    }

    #[test]
    fn bad_delay_is_rejected() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("PUBLISH_DELAY_MS", "soon"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = AppConfig::from_lookup(lookup(&CREDS)).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("secret_abc"));
        assert!(!dbg.contains("key:fx"));
    }
}
