//! LibreTranslate integration.
//!
//! Translation failures are reported in the response body
//! (`success: false` plus `error`) rather than as HTTP errors.

use crate::config::Config;
use crate::models::{TranslationRequest, TranslationResponse};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Language codes commonly offered by LibreTranslate instances.
pub const SUPPORTED_LANGUAGES: [&str; 33] = [
    "en", "ar", "az", "zh", "cs", "nl", "eo", "fi", "fr", "de", "el", "hi", "hu", "id", "ga", "it",
    "ja", "ko", "fa", "pl", "pt", "ru", "sk", "es", "sv", "tr", "uk", "vi", "bn", "ta", "te", "mr",
    "gu",
];

pub struct TranslationClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl TranslationClient {
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(
            config.libretranslate_url.clone(),
            config.libretranslate_api_key.clone(),
        )
    }

    pub fn with_endpoint(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(TRANSLATE_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url: api_url.into(),
            api_key,
        }
    }

    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResponse {
        let requested_source = known_language(&request.source_language);

        let mut payload = json!({
            "q": request.text,
            "source": request.source_language,
            "target": request.target_language,
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            payload["api_key"] = json!(key);
        }

        let response = match self.client.post(&self.api_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    "Translation request timed out".to_string()
                } else {
                    format!("Network error during translation: {}", e.without_url())
                };
                tracing::error!("{}", message);
                return failure(request, requested_source, message);
            }
        };

        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if !status.is_success() {
            let message = match body
                .as_ref()
                .and_then(|b| b.get("error"))
                .and_then(Value::as_str)
            {
                Some(detail) => format!("LibreTranslate API error: {}", detail),
                None => format!("LibreTranslate API error: HTTP {}", status.as_u16()),
            };
            tracing::error!("{}", message);
            return failure(request, requested_source, message);
        }

        let Some(body) = body else {
            tracing::error!("LibreTranslate returned an unreadable body");
            return failure(
                request,
                requested_source,
                "Unexpected error during translation: invalid response body".to_string(),
            );
        };

        // `detectedLanguage` is an object on recent versions and a bare code on older ones.
        let detected = match body.get("detectedLanguage") {
            Some(Value::Object(d)) => d.get("language").and_then(Value::as_str).map(str::to_string),
            Some(Value::String(code)) if !code.is_empty() => Some(code.clone()),
            _ => None,
        };
        let source_language = detected
            .as_deref()
            .and_then(known_language)
            .or(requested_source);

        match body
            .get("translatedText")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
        {
            Some(translated) => {
                tracing::info!(
                    "Translation successful: {} -> {}",
                    source_language.as_deref().unwrap_or("auto"),
                    request.target_language
                );
                TranslationResponse {
                    success: true,
                    translated_text: Some(translated.to_string()),
                    source_language,
                    target_language: request.target_language.clone(),
                    error: None,
                }
            }
            None => {
                tracing::error!("LibreTranslate API returned empty translation");
                failure(
                    request,
                    source_language,
                    "Translation returned empty result".to_string(),
                )
            }
        }
    }
}

/// `None` for "auto", which only means "detect it".
fn known_language(code: &str) -> Option<String> {
    match code {
        "" | "auto" => None,
        other => Some(other.to_string()),
    }
}

fn failure(
    request: &TranslationRequest,
    source_language: Option<String>,
    error: String,
) -> TranslationResponse {
    TranslationResponse {
        success: false,
        translated_text: None,
        source_language,
        target_language: request.target_language.clone(),
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_languages_include_indian_languages() {
        for code in ["hi", "te", "ta", "bn", "mr", "gu"] {
            assert!(SUPPORTED_LANGUAGES.contains(&code));
        }
    }

    #[tokio::test]
    async fn test_network_failure_is_reported_in_body() {
        let client = TranslationClient::with_endpoint("http://127.0.0.1:9/translate", None);
        let request = TranslationRequest {
            text: "Plant rice after the first rains".into(),
            target_language: "hi".into(),
            source_language: "auto".into(),
        };

        let response = client.translate(&request).await;

        assert!(!response.success);
        assert!(response.translated_text.is_none());
        assert!(response.source_language.is_none());
        assert_eq!(response.target_language, "hi");
        assert!(response.error.is_some());
    }
}
