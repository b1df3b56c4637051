// src/ingest/feed.rs
//! Feed document parsing for RSS 2.0, RSS 1.0 (RDF) and Atom.
//!
//! The root element decides which shape is used; anything else is a parse error.

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use once_cell::sync::OnceCell;

use crate::ingest::normalize_title;
use crate::ingest::types::{CandidateItem, FeedError};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

/// RSS 1.0 puts items next to the channel, not inside it.
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date", alias = "date")]
    dc_date: Option<String>,
    guid: Option<RssGuid>,
}

#[derive(Debug, Deserialize)]
struct RssGuid {
    #[serde(rename = "$text", default)]
    value: String,
    #[serde(rename = "@isPermaLink")]
    is_permalink: Option<String>,
}

impl RssGuid {
    /// A guid is a permalink unless it says otherwise, and only if it is an http(s) URL.
    fn permalink(&self) -> Option<&str> {
        let flagged = self
            .is_permalink
            .as_deref()
            .map_or(true, |v| v.trim().eq_ignore_ascii_case("true"));
        let v = self.value.trim();
        (flagged && (v.starts_with("http://") || v.starts_with("https://"))).then_some(v)
    }
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    /// `rel="alternate"` wins; a link without `rel` is alternate by definition.
    fn alternate_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .map(|l| l.href.as_str())
    }
}

/// Parse an RFC 2822 (`pubDate`) or RFC 3339 (`dc:date`, Atom) timestamp.
/// Unparseable input yields `None`, never an error.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let parsed = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()?;
    DateTime::from_timestamp(parsed.unix_timestamp(), 0)
}

fn root_element(xml: &str) -> Result<String, FeedError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(FeedError::Parse("empty document".into())),
            Ok(_) => {}
            Err(e) => return Err(FeedError::Parse(e.to_string())),
        }
    }
}

fn rss_candidate(it: RssItem) -> CandidateItem {
    let url = it
        .link
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .or_else(|| it.guid.as_ref().and_then(RssGuid::permalink))
        .unwrap_or_default()
        .to_string();
    CandidateItem {
        title: normalize_title(it.title.as_deref().unwrap_or_default()),
        url,
        published: it
            .pub_date
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| it.dc_date.as_deref().and_then(parse_timestamp)),
    }
}

fn atom_candidate(entry: AtomEntry) -> CandidateItem {
    CandidateItem {
        title: normalize_title(entry.title.as_ref().map(|t| t.value.as_str()).unwrap_or_default()),
        url: entry.alternate_link().unwrap_or_default().trim().to_string(),
        published: entry
            .published
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| entry.updated.as_deref().and_then(parse_timestamp)),
    }
}

/// Atom `type="xhtml"` titles hold markup, not text. Escape that markup so it
/// deserializes as text; `normalize_title` strips the tags afterwards.
fn escape_xhtml_titles(xml: &str) -> std::borrow::Cow<'_, str> {
    static RE_XHTML_TITLE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_XHTML_TITLE.get_or_init(|| {
        regex::Regex::new(
            r#"(?is)(<title\b[^>]*\btype\s*=\s*["']xhtml["'][^>]*>)(.*?)(</title>)"#,
        )
        .unwrap()
    });
    re.replace_all(xml, |c: &regex::Captures<'_>| {
        format!("{}{}{}", &c[1], html_escape::encode_text(&c[2]), &c[3])
    })
}

/// Parse a feed document into candidates, preserving document order.
pub fn parse_feed(xml: &str) -> Result<Vec<CandidateItem>, FeedError> {
    let t0 = std::time::Instant::now();
    let xml = xml.trim_start_matches('\u{feff}');
    let parse_err = |e: quick_xml::DeError| FeedError::Parse(e.to_string());

    let out: Vec<CandidateItem> = match root_element(xml)?.as_str() {
        "rss" => {
            let rss: Rss = from_str(xml).map_err(parse_err)?;
            rss.channel.items.into_iter().map(rss_candidate).collect()
        }
        "RDF" => {
            let rdf: Rdf = from_str(xml).map_err(parse_err)?;
            rdf.items.into_iter().map(rss_candidate).collect()
        }
        "feed" => {
            let atom: Atom = from_str(&escape_xhtml_titles(xml)).map_err(parse_err)?;
            atom.entries.into_iter().map(atom_candidate).collect()
        }
        other => {
            return Err(FeedError::Parse(format!(
                "unrecognized root element <{other}>"
            )))
        }
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_items_total").increment(out.len() as u64);
    Ok(out)
}
