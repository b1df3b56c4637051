use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value as Json};

use super::record::{BodyBlock, PublishedRecord};
use super::{RecordStore, StoreError};

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

const TIMEOUT_SECS: u64 = 30;

/// Notion database used as the record store.
pub struct NotionStore {
    http: Client,
    token: String,
    database_id: String,
    base_url: String,
}

#[derive(Deserialize)]
struct QueryResp {
    #[serde(default)]
    results: Vec<Json>,
}

impl NotionStore {
    pub fn new(token: &str, database_id: &str, base_url: Option<&str>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .context("building notion http client")?;
        Ok(Self {
            http,
            token: token.to_string(),
            database_id: database_id.to_string(),
            base_url: base_url
                .unwrap_or(NOTION_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn check(resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Filter body for an exact match on the `URL` property.
pub fn url_filter(url: &str) -> Json {
    json!({ "filter": { "property": "URL", "url": { "equals": url } } })
}

fn rich_text(content: &str) -> Json {
    json!([{ "type": "text", "text": { "content": content } }])
}

fn block_json(block: &BodyBlock) -> Json {
    match block {
        BodyBlock::Heading2(t) => json!({
            "object": "block",
            "type": "heading_2",
            "heading_2": { "rich_text": rich_text(t) }
        }),
        BodyBlock::Heading3(t) => json!({
            "object": "block",
            "type": "heading_3",
            "heading_3": { "rich_text": rich_text(t) }
        }),
        BodyBlock::Paragraph(t) => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": { "rich_text": rich_text(t) }
        }),
        BodyBlock::Link(url) => json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": {
                "rich_text": [{
                    "type": "text",
                    "text": { "content": url, "link": { "url": url } }
                }]
            }
        }),
    }
}

/// Page-create body for `record` under `database_id`.
pub fn page_payload(database_id: &str, record: &PublishedRecord) -> Json {
    let mut properties = json!({
        "Title": { "title": [{ "text": { "content": record.title } }] },
        "Source": { "rich_text": [{ "text": { "content": record.source } }] },
        "URL": { "url": record.url },
        "Published": { "date": { "start": record.published.format("%Y-%m-%d").to_string() } },
    });
    if let Some(summary) = &record.summary {
        properties["Summary"] = json!({ "rich_text": [{ "text": { "content": summary } }] });
    }

    json!({
        "parent": { "database_id": database_id },
        "properties": properties,
        "children": record.body.iter().map(block_json).collect::<Vec<_>>(),
    })
}

#[async_trait::async_trait]
impl RecordStore for NotionStore {
    async fn find_by_url(&self, url: &str) -> Result<usize, StoreError> {
        let endpoint = format!("{}/databases/{}/query", self.base_url, self.database_id);
        let resp = self
            .authed(self.http.post(endpoint))
            .json(&url_filter(url))
            .send()
            .await?;
        let parsed: QueryResp = Self::check(resp).await?.json().await?;
        Ok(parsed.results.len())
    }

    async fn create(&self, record: &PublishedRecord) -> Result<(), StoreError> {
        let endpoint = format!("{}/pages", self.base_url);
        let resp = self
            .authed(self.http.post(endpoint))
            .json(&page_payload(&self.database_id, record))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::{format_record, FormatOptions, RecordInput};
    use chrono::NaiveDate;

    fn record(with_summary: bool) -> PublishedRecord {
        format_record(
            &RecordInput {
                original_title: "Orig",
                translated_title: "訳",
                url: "https://example.test/a",
                source: "Example Feed",
                published: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            },
            &FormatOptions { with_summary },
        )
    }

    #[test]
    fn payload_carries_fixed_property_schema() {
        let p = page_payload("db-1", &record(false));
        assert_eq!(p["parent"]["database_id"], "db-1");
        assert_eq!(p["properties"]["Title"]["title"][0]["text"]["content"], "訳");
        assert_eq!(p["properties"]["Source"]["rich_text"][0]["text"]["content"], "Example Feed");
        assert_eq!(p["properties"]["URL"]["url"], "https://example.test/a");
        assert_eq!(p["properties"]["Published"]["date"]["start"], "2024-03-05");
        assert!(p["properties"].get("Summary").is_none());
    }

    #[test]
    fn children_are_heading_paragraph_heading_link() {
        let p = page_payload("db-1", &record(true));
        let kinds: Vec<&str> = p["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, ["heading_2", "paragraph", "heading_3", "paragraph"]);
        assert_eq!(
            p["children"][3]["paragraph"]["rich_text"][0]["text"]["link"]["url"],
            "https://example.test/a"
        );
        assert_eq!(p["properties"]["Summary"]["rich_text"][0]["text"]["content"], "訳");
    }

    #[test]
    fn url_filter_is_exact_equals() {
        let f = url_filter("https://example.test/a/");
        assert_eq!(f["filter"]["property"], "URL");
        assert_eq!(f["filter"]["url"]["equals"], "https://example.test/a/");
    }
}
