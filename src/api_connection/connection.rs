use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, Provider};
use crate::config::Settings;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not configured: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("API returned no content")]
    EmptyResponse,
}

/// Removes a surrounding markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

impl Provider {
    /// OpenRouter provider from the loaded settings. Fails up front when no
    /// API key is configured so callers never attempt an unauthenticated call.
    pub fn openrouter(settings: &Settings) -> Result<Self, ApiConnectionError> {
        let api_key = settings
            .openrouter_api_key
            .clone()
            .ok_or_else(|| ApiConnectionError::MissingApiKey("OPENROUTER_API_KEY".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.openrouter_timeout_secs))
            .build()?;
        Ok(Self::OpenRouter {
            api_key,
            base_url: settings.openrouter_base_url.trim_end_matches('/').to_string(),
            model: settings.openrouter_model.clone(),
            site_url: settings.site_url.clone(),
            app_name: settings.app_name.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenRouter { model, .. } => model,
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key,
                base_url,
                site_url,
                app_name,
                client,
                ..
            } => {
                let url = format!("{}/chat/completions", base_url);
                info!("Calling OpenRouter API with model: {}", request.model);

                let response = client
                    .post(&url)
                    .bearer_auth(api_key)
                    .header("Content-Type", "application/json")
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    debug!("OpenRouter response id: {}", chat_response.id);
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"b\": 2}  "), "{\"b\": 2}");
        assert_eq!(strip_code_fences("```"), "```");
    }

    #[test]
    fn test_openrouter_requires_api_key() {
        let settings = Settings::default();
        assert!(settings.openrouter_api_key.is_none());
        let result = Provider::openrouter(&settings);
        assert!(matches!(result, Err(ApiConnectionError::MissingApiKey(_))));
    }

    #[test]
    fn test_openrouter_from_settings() {
        let settings = Settings {
            openrouter_api_key: Some("sk-test".to_string()),
            openrouter_base_url: "http://localhost:9/api/v1/".to_string(),
            ..Settings::default()
        };
        let provider = Provider::openrouter(&settings).unwrap();
        assert_eq!(provider.model(), settings.openrouter_model);
        match provider {
            Provider::OpenRouter { base_url, .. } => {
                assert_eq!(base_url, "http://localhost:9/api/v1")
            }
        }
    }
}
