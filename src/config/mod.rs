use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::generation::GeneratorSettings;
use crate::services::pipeline::PipelineOptions;
use crate::services::sink::SinkKind;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// OpenRouter API key. Only required when the remote service is actually called.
    #[serde(default)]
    pub openrouter_api_key: String,

    /// Chat completions endpoint
    #[serde(default = "default_openrouter_url")]
    pub openrouter_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub generation_model: String,

    #[serde(default = "default_temperature")]
    pub generation_temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub generation_max_tokens: u32,

    /// Sent as the `HTTP-Referer` attribution header
    #[serde(default = "default_referer")]
    pub http_referer: String,

    /// Per-call timeout for the remote service, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Group size and upper bound on in-flight generation calls
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause between groups, in milliseconds
    #[serde(default = "default_group_delay_ms")]
    pub group_delay_ms: u64,

    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,

    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,

    /// Generation attempts per item. 1 means a single call with no retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Target directory of the JSON file sink
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Which persistence sink receives finished records ("json" or "postgres")
    #[serde(default)]
    pub sink: SinkKind,

    /// PostgreSQL connection string, required by the postgres sink
    pub database_url: Option<String>,

    /// Bind address of the Prometheus scrape listener (e.g. "0.0.0.0:9000")
    pub metrics_addr: Option<String>,
}

fn default_openrouter_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "deepseek/deepseek-r1-distill-llama-70b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2500
}

fn default_referer() -> String {
    "https://copycat-recipes.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_concurrency() -> usize {
    20
}

fn default_group_delay_ms() -> u64 {
    2000
}

fn default_jitter_min_ms() -> u64 {
    100
}

fn default_jitter_max_ms() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("generation_checkpoint.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("recipes_output")
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Settings for the remote generation client.
    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            api_key: self.openrouter_api_key.clone(),
            endpoint: self.openrouter_url.clone(),
            model: self.generation_model.clone(),
            temperature: self.generation_temperature,
            max_tokens: self.generation_max_tokens,
            referer: self.http_referer.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Jitter window applied before each remote call.
    pub fn jitter(&self) -> (Duration, Duration) {
        let min = self.jitter_min_ms.min(self.jitter_max_ms);
        (
            Duration::from_millis(min),
            Duration::from_millis(self.jitter_max_ms),
        )
    }

    /// Driver options. `concurrency` overrides the configured group size when given.
    pub fn pipeline_options(&self, concurrency: Option<usize>) -> PipelineOptions {
        PipelineOptions {
            concurrency: concurrency.unwrap_or(self.concurrency),
            group_delay: Duration::from_millis(self.group_delay_ms),
            max_attempts: self.max_attempts.max(1),
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}
