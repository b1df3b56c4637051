//! # Record Formatter
//! Pure assembly of a [`PublishedRecord`] from the normalized item fields.
//! No I/O; the wire encoding lives in `store::notion`.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Summary length cap, in characters.
pub const SUMMARY_MAX_CHARS: usize = 120;

pub const TRANSLATION_HEADING: &str = "翻訳";
pub const ORIGINAL_LINK_HEADING: &str = "原文リンク";
const TRANSLATED_LABEL: &str = "【日本語訳（見出し）】";
const ORIGINAL_LABEL: &str = "【原文見出し】";

/// One block of the record body, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyBlock {
    Heading2(String),
    Heading3(String),
    Paragraph(String),
    /// Paragraph whose text is a hyperlink to itself.
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    pub title: String,
    pub source: String,
    pub url: String,
    pub published: NaiveDate,
    pub body: Vec<BodyBlock>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecordInput<'a> {
    pub original_title: &'a str,
    pub translated_title: &'a str,
    pub url: &'a str,
    pub source: &'a str,
    pub published: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    pub with_summary: bool,
}

/// Calendar date stored for an item: the UTC date of its timestamp, or `today`
/// when the feed gave none.
pub fn published_date(ts: Option<DateTime<Utc>>, today: NaiveDate) -> NaiveDate {
    ts.map(|t| t.date_naive()).unwrap_or(today)
}

/// Today in the host's local time zone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Cap `s` at `max` characters; a cut string ends in `…` within the budget.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn bilingual_text(translated: &str, original: &str) -> String {
    format!("{TRANSLATED_LABEL}\n{translated}\n\n{ORIGINAL_LABEL}\n{original}")
}

pub fn format_record(input: &RecordInput<'_>, opts: &FormatOptions) -> PublishedRecord {
    let body = vec![
        BodyBlock::Heading2(TRANSLATION_HEADING.to_string()),
        BodyBlock::Paragraph(bilingual_text(input.translated_title, input.original_title)),
        BodyBlock::Heading3(ORIGINAL_LINK_HEADING.to_string()),
        BodyBlock::Link(input.url.to_string()),
    ];

    PublishedRecord {
        title: input.translated_title.to_string(),
        source: input.source.to_string(),
        url: input.url.to_string(),
        published: input.published,
        body,
        summary: opts
            .with_summary
            .then(|| truncate_chars(input.translated_title, SUMMARY_MAX_CHARS)),
    }
}
