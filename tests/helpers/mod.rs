//! Test doubles for driving the pipeline without network or storage

#![allow(dead_code)]

use async_trait::async_trait;
use copycat_recipes::models::generation::{GenerationRequest, RawResponse};
use copycat_recipes::models::recipe::NormalizedRecord;
use copycat_recipes::services::checkpoint::CheckpointStore;
use copycat_recipes::services::generation::{
    GenerationError, GenerationWorker, GeneratorSettings, TextGenerator,
};
use copycat_recipes::services::pipeline::{Pipeline, PipelineOptions};
use copycat_recipes::services::sink::{RecipeSink, SinkError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// When one call started and finished, by wall clock.
#[derive(Debug, Clone)]
pub struct CallSpan {
    pub prompt: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Scripted remote service. Responses are keyed by a substring of the user
/// prompt; every call is counted and in-flight concurrency is tracked.
#[derive(Debug)]
pub struct ScriptedGenerator {
    responses: Mutex<HashMap<String, Vec<Result<String, u16>>>>,
    default_response: String,
    latency: Duration,
    slow: Vec<(String, Duration)>,
    calls: Mutex<Vec<String>>,
    spans: Mutex<Vec<CallSpan>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(default_response: &str) -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            default_response: default_response.to_string(),
            latency: Duration::from_millis(5),
            slow: Vec::new(),
            calls: Mutex::new(Vec::new()),
            spans: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Use a different latency for prompts mentioning `needle`.
    pub fn slow(mut self, needle: &str, latency: Duration) -> Self {
        self.slow.push((needle.to_string(), latency));
        self
    }

    /// Queue responses for prompts mentioning `needle`. `Err(status)` simulates
    /// a non-success HTTP status. Once the queue is drained the default is used.
    pub fn script(self, needle: &str, responses: Vec<Result<&str, u16>>) -> Self {
        let queued = responses
            .into_iter()
            .rev()
            .map(|r| r.map(str::to_string))
            .collect();
        self.responses
            .lock()
            .unwrap()
            .insert(needle.to_string(), queued);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of calls whose prompt mentioned `needle`.
    pub fn calls_mentioning(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|prompt| prompt.contains(needle))
            .count()
    }

    /// Timing of the first call whose prompt mentioned `needle`.
    pub fn span_of(&self, needle: &str) -> CallSpan {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .find(|span| span.prompt.contains(needle))
            .cloned()
            .unwrap_or_else(|| panic!("no call mentioning {needle}"))
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, prompt: &str) -> Result<String, u16> {
        let mut responses = self.responses.lock().unwrap();
        for (needle, queue) in responses.iter_mut() {
            if prompt.contains(needle.as_str()) {
                if let Some(next) = queue.pop() {
                    return next;
                }
            }
        }
        Ok(self.default_response.clone())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, request: &GenerationRequest) -> Result<RawResponse, GenerationError> {
        let prompt = request.user_prompt().to_string();
        self.calls.lock().unwrap().push(prompt.clone());

        let latency = self
            .slow
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map_or(self.latency, |(_, latency)| *latency);

        let started = Instant::now();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.spans.lock().unwrap().push(CallSpan {
            prompt: prompt.clone(),
            started,
            finished: Instant::now(),
        });

        match self.next_response(&prompt) {
            Ok(text) => Ok(RawResponse::ok(text)),
            Err(status) => Err(GenerationError::Remote {
                status,
                body: "scripted failure".to_string(),
            }),
        }
    }
}

/// Sink that keeps records in memory and can be told to reject some titles.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<NormalizedRecord>>,
    reject_brand: Option<String>,
}

impl MemorySink {
    pub fn rejecting_brand(brand: &str) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            reject_brand: Some(brand.to_string()),
        }
    }

    pub fn saved(&self) -> Vec<NormalizedRecord> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecipeSink for MemorySink {
    async fn save(&self, record: &NormalizedRecord) -> Result<String, SinkError> {
        if self.reject_brand.as_deref() == Some(record.brand_name.as_str()) {
            return Err(SinkError::Io {
                path: "memory".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "rejected"),
            });
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(record.clone());
        Ok(format!("memory-{}", saved.len()))
    }
}

pub fn test_settings() -> GeneratorSettings {
    GeneratorSettings {
        api_key: "unused".to_string(),
        endpoint: "http://localhost".to_string(),
        model: "test/model".to_string(),
        temperature: 0.7,
        max_tokens: 2500,
        referer: "https://copycat-recipes.com".to_string(),
        timeout: Duration::from_secs(5),
    }
}

/// Options with no delays so tests run fast.
pub fn fast_options(concurrency: usize) -> PipelineOptions {
    PipelineOptions {
        concurrency,
        group_delay: Duration::ZERO,
        max_attempts: 1,
        retry_base_delay: Duration::from_millis(1),
    }
}

pub fn build_pipeline(
    generator: Arc<ScriptedGenerator>,
    sink: Arc<MemorySink>,
    checkpoint_path: &Path,
    options: PipelineOptions,
) -> Pipeline {
    let worker = GenerationWorker::new(generator, &test_settings())
        .with_jitter(Duration::ZERO, Duration::ZERO);
    let checkpoint = Arc::new(CheckpointStore::new(checkpoint_path));
    Pipeline::new(worker, checkpoint, sink, options).expect("valid pipeline options")
}
