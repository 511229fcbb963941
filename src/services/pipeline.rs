//! Group-synchronous batch driver.
//!
//! Items are processed in consecutive groups of `concurrency`. Every item of a
//! group runs concurrently; the next group starts only after the whole group has
//! settled. Checkpointed items are skipped, and each success is flushed to the
//! checkpoint before the group completes.

use futures::future::join_all;
use garde::Validate;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::models::recipe::NormalizedRecord;
use crate::models::source_item::SourceItem;
use crate::models::summary::RunSummary;
use crate::services::categorizer;
use crate::services::checkpoint::{CheckpointError, CheckpointStore};
use crate::services::generation::{GenerationError, GenerationWorker};
use crate::services::parser::{self, ParseError};
use crate::services::sink::{RecipeSink, SinkError};

/// Attempts made to flush a checkpoint entry before the run is aborted.
const CHECKPOINT_WRITE_ATTEMPTS: u32 = 3;
const CHECKPOINT_RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Group size; also the upper bound on concurrent generation calls.
    pub concurrency: usize,
    /// Pause between groups that dispatched work.
    pub group_delay: Duration,
    /// Generate+parse attempts per item. 1 disables retries.
    pub max_attempts: u32,
    /// Backoff before retry `n` is `retry_base_delay * 2^(n-1)`.
    pub retry_base_delay: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: 20,
            group_delay: Duration::from_secs(2),
            max_attempts: 1,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// Failure of a single item. Never aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("record failed validation: {0}")]
    Invalid(#[from] garde::Report),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Run-level failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid pipeline options: {0}")]
    InvalidOptions(String),

    #[error("checkpoint write failed for item {item_id}, aborting run: {source}")]
    Checkpoint {
        item_id: String,
        #[source]
        source: CheckpointError,
    },
}

enum ItemOutcome {
    Saved { sink_id: String },
    Failed(ItemError),
    CheckpointFailed(CheckpointError),
}

pub struct Pipeline {
    worker: GenerationWorker,
    checkpoint: Arc<CheckpointStore>,
    sink: Arc<dyn RecipeSink>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        worker: GenerationWorker,
        checkpoint: Arc<CheckpointStore>,
        sink: Arc<dyn RecipeSink>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        if options.concurrency == 0 {
            return Err(PipelineError::InvalidOptions(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            worker,
            checkpoint,
            sink,
            options,
        })
    }

    /// Process every item not already in the checkpoint.
    pub async fn run(&self, items: &[SourceItem]) -> Result<RunSummary, PipelineError> {
        let mut processed = self.checkpoint.load().await;
        let mut summary = RunSummary::default();

        let groups: Vec<&[SourceItem]> = items.chunks(self.options.concurrency).collect();
        tracing::info!(
            items = items.len(),
            groups = groups.len(),
            concurrency = self.options.concurrency,
            already_processed = processed.len(),
            "Starting generation run"
        );

        for (index, group) in groups.iter().enumerate() {
            let pending = self.select_pending(group, &processed, &mut summary);
            tracing::info!(
                group = index + 1,
                of = groups.len(),
                dispatched = pending.len(),
                "Processing group"
            );
            if pending.is_empty() {
                continue;
            }

            let outcomes = join_all(pending.iter().map(|item| self.process_item(item))).await;

            let mut checkpoint_failure = None;
            for (item, outcome) in pending.iter().zip(outcomes) {
                match outcome {
                    ItemOutcome::Saved { sink_id } => {
                        processed.insert(item.id.clone());
                        summary.succeeded += 1;
                        metrics::counter!("recipes_generated_total").increment(1);
                        tracing::info!(item_id = %item.id, saved_as = %sink_id, "Item completed");
                    }
                    ItemOutcome::Failed(e) => {
                        summary.failed += 1;
                        metrics::counter!("recipes_failed_total").increment(1);
                        tracing::error!(
                            item_id = %item.id,
                            product = %item.product_name,
                            error = %e,
                            "Item failed"
                        );
                    }
                    ItemOutcome::CheckpointFailed(source) => {
                        // The record reached the sink, so it counts as produced.
                        summary.succeeded += 1;
                        checkpoint_failure.get_or_insert(PipelineError::Checkpoint {
                            item_id: item.id.clone(),
                            source,
                        });
                    }
                }
            }

            if let Some(err) = checkpoint_failure {
                tracing::error!(error = %err, ?summary, "Aborting run");
                return Err(err);
            }

            let is_last = index + 1 == groups.len();
            if !is_last && !self.options.group_delay.is_zero() {
                sleep(self.options.group_delay).await;
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Generation run complete"
        );
        Ok(summary)
    }

    /// Items of a group that still need work. Checkpointed items and repeats of
    /// an identifier earlier in the same group are counted as skipped.
    fn select_pending<'a>(
        &self,
        group: &'a [SourceItem],
        processed: &HashSet<String>,
        summary: &mut RunSummary,
    ) -> Vec<&'a SourceItem> {
        let mut seen = HashSet::new();
        let mut pending = Vec::with_capacity(group.len());
        for item in group {
            if processed.contains(&item.id) || !seen.insert(item.id.as_str()) {
                summary.skipped += 1;
                metrics::counter!("recipes_skipped_total").increment(1);
                tracing::info!(item_id = %item.id, product = %item.product_name, "Skipping already processed item");
                continue;
            }
            pending.push(item);
        }
        pending
    }

    async fn process_item(&self, item: &SourceItem) -> ItemOutcome {
        let started = Instant::now();

        let record = match self.generate_record(item).await {
            Ok(record) => record,
            Err(e) => return ItemOutcome::Failed(e),
        };

        let sink_id = match self.save(&record).await {
            Ok(id) => id,
            Err(e) => return ItemOutcome::Failed(e),
        };
        metrics::histogram!("recipe_generation_seconds").record(started.elapsed().as_secs_f64());

        match self.flush_checkpoint(&item.id).await {
            Ok(()) => ItemOutcome::Saved { sink_id },
            Err(e) => ItemOutcome::CheckpointFailed(e),
        }
    }

    /// Generate, parse and finalize a record, retrying up to `max_attempts`.
    async fn generate_record(&self, item: &SourceItem) -> Result<NormalizedRecord, ItemError> {
        let mut attempt = 1;
        loop {
            match self.attempt_generation(item).await {
                Ok(record) => return Ok(record),
                Err(e) if attempt < self.options.max_attempts => {
                    let backoff = self.backoff(attempt);
                    tracing::warn!(
                        item_id = %item.id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Generation attempt failed, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt_generation(&self, item: &SourceItem) -> Result<NormalizedRecord, ItemError> {
        let raw = self.worker.generate(item).await?;
        let parsed = parser::parse(&raw.text).inspect_err(|e| {
            tracing::debug!(item_id = %item.id, error = %e, raw = %raw.text, "Unparseable response");
        })?;
        Ok(finalize(parsed, item))
    }

    async fn save(&self, record: &NormalizedRecord) -> Result<String, ItemError> {
        record.validate()?;
        Ok(self.sink.save(record).await?)
    }

    async fn flush_checkpoint(&self, id: &str) -> Result<(), CheckpointError> {
        let mut attempt = 1;
        loop {
            match self.checkpoint.record(id).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < CHECKPOINT_WRITE_ATTEMPTS => {
                    tracing::warn!(item_id = %id, attempt, error = %e, "Checkpoint write failed, retrying");
                    sleep(CHECKPOINT_RETRY_DELAY).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(item_id = %id, error = %e, "Checkpoint write failed");
                    return Err(e);
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.options.retry_base_delay.saturating_mul(factor)
    }
}

/// Apply item-level facts to a parsed record: brand, canonical category and
/// image URL fallback.
pub fn finalize(mut record: NormalizedRecord, item: &SourceItem) -> NormalizedRecord {
    let suggested = Some(record.category.trim()).filter(|c| !c.is_empty());
    let provided = item.category_hint.as_deref().or(suggested);

    record.category = categorizer::categorize(&item.product_name, &item.brand_name, provided);
    record.brand_name = item.brand_name.clone();
    if record.image_url.trim().is_empty() {
        record.image_url = item.image_url.clone().unwrap_or_default();
    }
    record
}
