use serde::{Deserialize, Serialize};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// Chat-completions backends the recommender can talk to.
#[derive(Clone, Debug)]
pub enum Provider {
    OpenRouter {
        api_key: String,
        base_url: String,
        model: String,
        /// Sent as `HTTP-Referer`
        site_url: String,
        /// Sent as `X-Title`
        app_name: String,
        client: reqwest::Client,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponseMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: Option<u32>,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<ChatCompletionUsage>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the model produced any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization_skips_unset_fields() {
        let request = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::user("hi")],
            response_format: Some(ResponseFormat::json_object()),
            temperature: None,
            max_tokens: Some(10),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"], json!({ "type": "json_object" }));
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn test_response_first_content() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "gen-1",
            "model": "m",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "  {\"a\":1} " } }
            ]
        }))
        .unwrap();
        assert_eq!(response.first_content(), Some("{\"a\":1}"));

        let empty: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert_eq!(empty.first_content(), None);
    }
}
