use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::models::generation::{ChatMessage, GenerationRequest, RawResponse};
use crate::models::source_item::SourceItem;
use crate::services::prompt;

/// Connection and model parameters for the remote generation service.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub referer: String,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote service returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("remote service returned no usable completion: {0}")]
    MalformedResponse(String),

    #[error("generation client not configured: {0}")]
    NotConfigured(String),
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Transport(e) if e.is_timeout())
    }
}

/// One request/response call against a text generation backend.
///
/// Implementations make exactly one call per invocation and never retry.
#[async_trait]
pub trait TextGenerator: Send + Sync + fmt::Debug {
    async fn complete(&self, request: &GenerationRequest) -> Result<RawResponse, GenerationError>;
}

/// Chat completions client for OpenRouter.
#[derive(Debug)]
pub struct OpenRouterClient {
    http: Client,
    endpoint: String,
    api_key: String,
    referer: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(settings: &GeneratorSettings) -> Result<Self, GenerationError> {
        if settings.api_key.trim().is_empty() {
            return Err(GenerationError::NotConfigured(
                "OPENROUTER_API_KEY is not set".to_string(),
            ));
        }

        let http = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            referer: settings.referer.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<RawResponse, GenerationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let model = completion.model;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::MalformedResponse("no choices in response".to_string()))?;

        let text = choice
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| GenerationError::MalformedResponse("empty message content".to_string()))?;

        Ok(RawResponse {
            text,
            status: status.as_u16(),
            model,
            finish_reason: choice.finish_reason,
        })
    }
}

/// Renders the prompt for an item and performs a single jittered call.
#[derive(Debug, Clone)]
pub struct GenerationWorker {
    generator: Arc<dyn TextGenerator>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    jitter_min: Duration,
    jitter_max: Duration,
}

impl GenerationWorker {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: &GeneratorSettings) -> Self {
        Self {
            generator,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            jitter_min: Duration::from_millis(100),
            jitter_max: Duration::from_millis(500),
        }
    }

    /// Set the random delay window applied before each call.
    pub fn with_jitter(mut self, min: Duration, max: Duration) -> Self {
        self.jitter_min = min.min(max);
        self.jitter_max = max;
        self
    }

    pub fn build_request(&self, item: &SourceItem) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompt::SYSTEM_PROMPT),
                ChatMessage::user(prompt::render_user_prompt(item)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Generate raw recipe text for one item.
    pub async fn generate(&self, item: &SourceItem) -> Result<RawResponse, GenerationError> {
        let request = self.build_request(item);

        let delay = self.jitter_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        tracing::debug!(item_id = %item.id, model = %request.model, "Dispatching generation request");
        self.generator.complete(&request).await
    }

    fn jitter_delay(&self) -> Duration {
        if self.jitter_max <= self.jitter_min {
            return self.jitter_min;
        }
        let min = self.jitter_min.as_millis() as u64;
        let max = self.jitter_max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(endpoint: String) -> GeneratorSettings {
        GeneratorSettings {
            api_key: "test-key".to_string(),
            endpoint,
            model: "test/model".to_string(),
            temperature: 0.7,
            max_tokens: 2500,
            referer: "https://copycat-recipes.com".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn item() -> SourceItem {
        SourceItem::new(None, "Original", "Pringles", None, None)
    }

    async fn worker_for(server: &MockServer) -> GenerationWorker {
        let settings = settings(format!("{}/api/v1/chat/completions", server.uri()));
        let client = OpenRouterClient::new(&settings).unwrap();
        GenerationWorker::new(Arc::new(client), &settings)
            .with_jitter(Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "test/model",
                "choices": [{
                    "message": {"role": "assistant", "content": "{\"title\":\"X\"}"},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = worker_for(&server).await.generate(&item()).await.unwrap();
        assert_eq!(response.text, "{\"title\":\"X\"}");
        assert_eq!(response.status, 200);
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let err = worker_for(&server).await.generate(&item()).await.unwrap_err();
        match err {
            GenerationError::Remote { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = worker_for(&server).await.generate(&item()).await.unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let mut settings = settings(format!("{}/api/v1/chat/completions", server.uri()));
        settings.timeout = Duration::from_millis(200);
        let client = OpenRouterClient::new(&settings).unwrap();
        let worker = GenerationWorker::new(Arc::new(client), &settings)
            .with_jitter(Duration::ZERO, Duration::ZERO);

        let err = worker.generate(&item()).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let mut settings = settings("http://localhost".to_string());
        settings.api_key = String::new();
        assert!(matches!(
            OpenRouterClient::new(&settings),
            Err(GenerationError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_request_carries_system_and_user_messages() {
        let settings = settings("http://localhost".to_string());
        let client = OpenRouterClient::new(&settings).unwrap();
        let worker = GenerationWorker::new(Arc::new(client), &settings);
        let request = worker.build_request(&item());

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.user_prompt().contains("Pringles Original"));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "test/model");
        assert_eq!(body["max_tokens"], 2500);
    }
}
