use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

/// A rendered prompt plus model parameters, built fresh for every attempt.
/// Serializes directly into the chat completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Content of the user message.
    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Completion text returned by the remote service, with status metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub text: String,
    pub status: u16,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
}

impl RawResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: 200,
            model: None,
            finish_reason: None,
        }
    }
}
