use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use std::fmt;
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::db::queries;
use crate::models::recipe::NormalizedRecord;

/// Which persistence sink receives finished records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SinkKind {
    #[default]
    Json,
    Postgres,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write recipe file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize recipe: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Destination for finished, validated recipe records.
#[async_trait]
pub trait RecipeSink: Send + Sync + fmt::Debug {
    /// Persist a record and return an identifier for it.
    async fn save(&self, record: &NormalizedRecord) -> Result<String, SinkError>;
}

/// Writes each record as a pretty-printed JSON file.
#[derive(Debug)]
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

/// Upper bound on the stem, in bytes. The `_xxxxxxxx.json` suffix adds 14
/// more, which keeps file names under the common 255-byte limit.
const MAX_FILE_STEM_BYTES: usize = 200;

/// Filesystem-friendly version of a recipe title, truncated on a character
/// boundary to [`MAX_FILE_STEM_BYTES`].
pub fn safe_file_stem(record: &NormalizedRecord) -> String {
    let title = if record.title.trim().is_empty() {
        format!("{}_recipe", record.brand_name.trim())
    } else {
        record.title.trim().to_string()
    };

    let mut stem = String::new();
    for c in title.chars().filter(|c| !c.is_control() && *c != ':') {
        let c = match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        };
        if stem.len() + c.len_utf8() > MAX_FILE_STEM_BYTES {
            break;
        }
        stem.push(c);
    }
    stem
}

#[async_trait]
impl RecipeSink for JsonFileSink {
    async fn save(&self, record: &NormalizedRecord) -> Result<String, SinkError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| SinkError::Io { path, source }
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(io_err(&self.output_dir))?;

        let suffix = Uuid::new_v4().simple().to_string();
        let filename = format!("{}_{}.json", safe_file_stem(record), &suffix[..8]);
        let path = self.output_dir.join(filename);

        let payload = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, payload).await.map_err(io_err(&path))?;

        tracing::info!(path = %path.display(), "Saved recipe");
        Ok(path.display().to_string())
    }
}

/// Inserts records into the `recipes` table.
#[derive(Debug, Clone)]
pub struct PgRecipeSink {
    pool: PgPool,
}

impl PgRecipeSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeSink for PgRecipeSink {
    async fn save(&self, record: &NormalizedRecord) -> Result<String, SinkError> {
        let id = queries::insert_recipe(&self.pool, record).await?;
        tracing::info!(recipe_id = %id, "Inserted recipe");
        Ok(id.to_string())
    }
}
