//! MyMemory translation API client (free tier, no key required).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{Language, TranslationService};
use crate::errors::{AppError, AppResult};

/// Default public endpoint
pub const DEFAULT_MYMEMORY_URL: &str = "https://api.mymemory.translated.net/get";

/// Marker MyMemory puts into `translatedText` when the free quota is exhausted
const QUOTA_WARNING_PREFIX: &str = "MYMEMORY WARNING";

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: MyMemoryResponseData,
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponseData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// HTTP client for `GET {base_url}?q=<text>&langpair=<src>|<dst>`
#[derive(Debug, Clone)]
pub struct MyMemoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl MyMemoryClient {
    /// `client` is expected to carry the bounded request timeout
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TranslationService for MyMemoryClient {
    fn name(&self) -> &str {
        "mymemory"
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> AppResult<Option<String>> {
        let langpair = format!("{}|{}", source.code(), target.code());
        debug!(text = %text, langpair = %langpair, "Requesting remote translation");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "translation service returned HTTP {}",
                response.status()
            )));
        }

        let body: MyMemoryResponse = response.json().await?;
        parse_translated_text(body.response_data.translated_text)
    }
}

fn parse_translated_text(text: Option<String>) -> AppResult<Option<String>> {
    match text {
        Some(t) if t.starts_with(QUOTA_WARNING_PREFIX) => Err(AppError::Network(
            "translation service quota exhausted".to_string(),
        )),
        Some(t) if t.trim().is_empty() => Ok(None),
        Some(t) => Ok(Some(t.trim().to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_body() {
        let body: MyMemoryResponse = serde_json::from_str(
            r#"{"responseData":{"translatedText":"кошка","match":1},"responseStatus":200}"#,
        )
        .unwrap();
        assert_eq!(
            parse_translated_text(body.response_data.translated_text).unwrap(),
            Some("кошка".to_string())
        );
    }

    #[test]
    fn test_quota_warning_is_an_error() {
        let result = parse_translated_text(Some(
            "MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS FOR TODAY".to_string(),
        ));
        assert!(matches!(result, Err(AppError::Network(_))));
    }

    #[test]
    fn test_blank_translation_is_absent() {
        assert_eq!(parse_translated_text(Some("  ".to_string())).unwrap(), None);
        assert_eq!(parse_translated_text(None).unwrap(), None);
    }
}
