use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatCompletionRequest {
    /// System instruction first, then the user's prompt.
    pub fn new(model: &str, system_prompt: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: prompt.to_string(),
                },
            ],
        }
    }
}

/// Message as returned by the provider. `role` is left open and `content`
/// may be `null` or absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    pub fn first_answer(self) -> Result<String, UpstreamError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(UpstreamError::NoChoices)
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to upstream failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upstream returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid completion payload: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("upstream returned no completion choices")]
    NoChoices,
}

/// Anything able to turn a chat-completion request into a response.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, UpstreamError>;
}

/// OpenAI-compatible client pointed at Groq. The credential is supplied per
/// call so the server can keep it out of the client itself.
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
}

impl GroqClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatClient for GroqClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, UpstreamError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(UpstreamError::Transport)?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status,
                message: provider_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(UpstreamError::Decode)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

// Prefer the provider's `{"error":{"message":..}}` text, fall back to the raw body.
fn provider_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => {
            let raw = body.trim();
            if raw.is_empty() {
                "<empty response body>".to_string()
            } else {
                raw.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_puts_system_message_before_user_prompt() {
        let request = ChatCompletionRequest::new("llama-3.1-8b-instant", "be helpful", "hi");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "llama-3.1-8b-instant",
                "messages": [
                    { "role": "system", "content": "be helpful" },
                    { "role": "user", "content": "hi" }
                ]
            })
        );
    }

    #[test]
    fn response_ignores_unknown_fields() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop", "logprobs": null}
            ],
            "usage": {"total_tokens": 12}
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.first_answer().unwrap(), "hello");
    }

    #[test]
    fn first_answer_takes_the_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "first"}},
                {"index": 1, "message": {"role": "assistant", "content": "second"}}
            ]
        }))
        .unwrap();

        assert_eq!(response.first_answer().unwrap(), "first");
    }

    #[test]
    fn null_content_becomes_empty_answer() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": null}, "finish_reason": "stop"}
            ]
        }))
        .unwrap();

        assert_eq!(response.first_answer().unwrap(), "");
    }

    #[test]
    fn unknown_roles_are_accepted() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "tool", "content": "42"}}]
        }))
        .unwrap();

        assert_eq!(response.choices[0].message.role.as_deref(), Some("tool"));
        assert_eq!(response.first_answer().unwrap(), "42");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();

        assert!(matches!(
            response.first_answer(),
            Err(UpstreamError::NoChoices)
        ));
    }

    #[test]
    fn provider_error_message_unwraps_envelope() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert_eq!(provider_error_message(body), "Invalid API Key");
    }

    #[test]
    fn provider_error_message_falls_back_to_raw_body() {
        assert_eq!(provider_error_message("  bad gateway \n"), "bad gateway");
        assert_eq!(provider_error_message(""), "<empty response body>");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = GroqClient::new("http://localhost:1234/openai/v1/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:1234/openai/v1/chat/completions"
        );
    }
}
