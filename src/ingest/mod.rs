// src/ingest/mod.rs
pub mod feed;
pub mod http;
pub mod types;

use once_cell::sync::OnceCell;

use crate::ingest::types::{CandidateItem, FeedError, FeedReader, SourceDescriptor};

/// Normalize a headline: decode HTML entities, strip tags, collapse whitespace, trim.
/// Sentence punctuation is kept; it belongs to the headline.
pub fn normalize_title(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    let stripped = re_tags.replace_all(&decoded, "");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&stripped, " ").trim().to_string()
}

/// Fetch `source` and keep at most `source.limit` entries, in feed order.
pub async fn fetch_source(
    reader: &dyn FeedReader,
    source: &SourceDescriptor,
) -> Result<Vec<CandidateItem>, FeedError> {
    let mut items = reader.fetch(source).await?;
    items.truncate(source.limit);
    Ok(items)
}
