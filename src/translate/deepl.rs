use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{TranslateError, Translator};

pub const DEEPL_FREE_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";
pub const DEEPL_PRO_ENDPOINT: &str = "https://api.deepl.com/v2/translate";

const TIMEOUT_SECS: u64 = 30;

/// Free-tier keys carry a `:fx` suffix and only work against the free host.
pub fn endpoint_for_key(api_key: &str) -> &'static str {
    if api_key.trim().ends_with(":fx") {
        DEEPL_FREE_ENDPOINT
    } else {
        DEEPL_PRO_ENDPOINT
    }
}

#[derive(Serialize)]
struct TranslateForm<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct TranslateResp {
    #[serde(default)]
    translations: Vec<TranslatedText>,
}

#[derive(Deserialize)]
struct TranslatedText {
    text: String,
}

pub struct DeeplTranslator {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl DeeplTranslator {
    /// `endpoint_override` replaces the key-derived endpoint (local doubles, proxies).
    pub fn new(api_key: &str, endpoint_override: Option<&str>) -> anyhow::Result<Self> {
        let api_key = api_key.trim().to_string();
        let endpoint = endpoint_override
            .map(str::to_string)
            .unwrap_or_else(|| endpoint_for_key(&api_key).to_string());
        let http = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .context("building deepl http client")?;
        Ok(Self {
            http,
            api_key,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Translator for DeeplTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("DeepL-Auth-Key {}", self.api_key),
            )
            .form(&TranslateForm {
                text,
                source_lang,
                target_lang,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TranslateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranslateResp = resp.json().await?;
        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or(TranslateError::Empty)
    }
}
