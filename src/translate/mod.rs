//! Headline translation behind a small trait, so the pipeline never sees the wire format.

pub mod deepl;

pub use deepl::DeeplTranslator;

/// Original and translated text of one headline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub original: String,
    pub translated: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("translation response had no translations")]
    Empty,
}

#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`.
    /// Implementations must return an empty string for empty input without any I/O.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError>;
}

/// Translate with the graceful fallback policy: on any failure the original text
/// stands in for the translation. The second element is the error, if one occurred.
pub async fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    source_lang: &str,
    target_lang: &str,
) -> (Translation, Option<TranslateError>) {
    match translator.translate(text, source_lang, target_lang).await {
        Ok(translated) => (
            Translation {
                original: text.to_string(),
                translated,
            },
            None,
        ),
        Err(e) => (
            Translation {
                original: text.to_string(),
                translated: text.to_string(),
            },
            Some(e),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    #[async_trait::async_trait]
    impl Translator for Upper {
        async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String, TranslateError> {
            Ok(text.to_uppercase())
        }
    }

    struct Down;

    #[async_trait::async_trait]
    impl Translator for Down {
        async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslateError> {
            Err(TranslateError::Status {
                status: 456,
                body: "Quota exceeded".into(),
            })
        }
    }

    #[tokio::test]
    async fn success_keeps_both_texts() {
        let (t, err) = translate_or_original(&Upper, "hello", "EN", "JA").await;
        assert!(err.is_none());
        assert_eq!(t.original, "hello");
        assert_eq!(t.translated, "HELLO");
    }

    #[tokio::test]
    async fn failure_falls_back_to_original() {
        let (t, err) = translate_or_original(&Down, "hello", "EN", "JA").await;
        assert!(matches!(err, Some(TranslateError::Status { status: 456, .. })));
        assert_eq!(t.translated, "hello");
    }
}
