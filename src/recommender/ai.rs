use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::templates::general_tips;
use super::{Alternative, RecommendationRequest};
use crate::api_connection::{
    strip_code_fences, ApiConnectionError, ChatCompletionRequest, ChatMessage, Provider,
    ResponseFormat,
};
use crate::config::Settings;

pub const MIN_ALTERNATIVES: usize = 3;
pub const MAX_ALTERNATIVES: usize = 5;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Api(#[from] ApiConnectionError),
    #[error("Response is not valid alternatives JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Expected at least 3 named alternatives, got {0}")]
    TooFewAlternatives(usize),
}

/// Alternatives produced by a generator, before provenance is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAlternatives {
    pub summary: String,
    pub alternatives: Vec<Alternative>,
    pub general_tips: Vec<String>,
}

impl GeneratedAlternatives {
    /// Drops nameless items, requires at least three, keeps at most five.
    pub fn into_usable(mut self) -> Result<Self, GenerationError> {
        self.alternatives.retain(|a| !a.name.trim().is_empty());
        if self.alternatives.len() < MIN_ALTERNATIVES {
            return Err(GenerationError::TooFewAlternatives(self.alternatives.len()));
        }
        self.alternatives.truncate(MAX_ALTERNATIVES);
        if self.general_tips.is_empty() {
            self.general_tips = general_tips();
        }
        Ok(self)
    }
}

#[async_trait]
pub trait AlternativesGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        request: &RecommendationRequest,
    ) -> Result<GeneratedAlternatives, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    summary: Option<String>,
    alternatives: Vec<RawAlternative>,
    #[serde(default)]
    general_tips: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawAlternative {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    why_better: Option<String>,
    #[serde(default)]
    key_benefits: Option<Vec<String>>,
    #[serde(default)]
    estimated_improvements: Option<Value>,
}

fn improvements_map(value: Option<Value>) -> BTreeMap<String, String> {
    match value {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Parses the model's reply. Tolerates markdown fences and loose field types;
/// requires an `alternatives` array.
pub fn parse_generated(content: &str) -> Result<GeneratedAlternatives, GenerationError> {
    let raw: RawResponse = serde_json::from_str(strip_code_fences(content))?;
    let alternatives = raw
        .alternatives
        .into_iter()
        .map(|a| Alternative {
            name: a.name.unwrap_or_default().trim().to_string(),
            brand: a
                .brand
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "Generic".to_string()),
            why_better: a.why_better.unwrap_or_default(),
            key_benefits: a.key_benefits.unwrap_or_default(),
            estimated_improvements: improvements_map(a.estimated_improvements),
        })
        .collect();

    Ok(GeneratedAlternatives {
        summary: raw.summary.unwrap_or_default(),
        alternatives,
        general_tips: raw.general_tips.unwrap_or_default(),
    })
}

/// AI tier backed by OpenRouter chat completions.
pub struct OpenRouterGenerator {
    provider: Provider,
}

impl OpenRouterGenerator {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// `None` when no API key is configured or the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        match Provider::openrouter(settings) {
            Ok(provider) => {
                info!(model = provider.model(), "AI recommendations enabled");
                Some(Self::new(provider))
            }
            Err(ApiConnectionError::MissingApiKey(var)) => {
                info!("{} not set, AI recommendations disabled", var);
                None
            }
            Err(e) => {
                warn!("AI recommendations disabled: {}", e);
                None
            }
        }
    }

    fn chat_request(&self, request: &RecommendationRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.provider.model().to_string(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(request)),
            ],
            response_format: Some(ResponseFormat::json_object()),
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
        }
    }
}

#[async_trait]
impl AlternativesGenerator for OpenRouterGenerator {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate(
        &self,
        request: &RecommendationRequest,
    ) -> Result<GeneratedAlternatives, GenerationError> {
        info!(product = %request.product_name, "Requesting AI alternatives");
        let response = self
            .provider
            .call_chat_completion(self.chat_request(request))
            .await?;
        let content = response
            .first_content()
            .ok_or(ApiConnectionError::EmptyResponse)?;
        debug!("AI reply: {} chars", content.len());
        parse_generated(content)
    }
}
