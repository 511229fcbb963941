use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// On-disk checkpoint document. Identifiers keep their insertion order so the
/// file stays easy to read.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    #[serde(default)]
    processed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint file {path} is not valid: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable set of processed item identifiers, stored as one JSON file.
///
/// Every `record` rewrites the whole set. Writes go to a sibling temp file and
/// are renamed into place, so an abrupt stop leaves either the old or the new
/// set on disk. Mutation is serialized by an internal lock.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Load the processed set. A missing file is an empty set; an unreadable or
    /// corrupt one is moved aside and also treated as empty.
    pub async fn load(&self) -> HashSet<String> {
        let _guard = self.lock.lock().await;

        match self.read_file().await {
            Ok(file) => {
                let processed: HashSet<String> = file.processed.into_iter().collect();
                tracing::info!(
                    path = %self.path.display(),
                    processed = processed.len(),
                    "Loaded checkpoint"
                );
                processed
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Checkpoint unreadable, starting with an empty set"
                );
                let backup = self.sibling(&format!(
                    "corrupt-{}",
                    Utc::now().format("%Y%m%dT%H%M%S%.9fZ")
                ));
                if let Err(rename_err) = tokio::fs::rename(&self.path, &backup).await {
                    if rename_err.kind() != ErrorKind::NotFound {
                        tracing::warn!(
                            path = %self.path.display(),
                            error = %rename_err,
                            "Could not move unreadable checkpoint aside"
                        );
                    }
                }
                HashSet::new()
            }
        }
    }

    /// Add an identifier and flush the whole set. Recording an identifier that
    /// is already present does not touch the file.
    pub async fn record(&self, id: &str) -> Result<(), CheckpointError> {
        let _guard = self.lock.lock().await;

        let mut file = self.read_file().await?;
        if file.processed.iter().any(|existing| existing == id) {
            return Ok(());
        }

        file.processed.push(id.to_string());
        file.updated_at = Some(Utc::now());
        self.write_file(&file).await?;

        tracing::debug!(item_id = %id, processed = file.processed.len(), "Checkpoint flushed");
        Ok(())
    }

    async fn read_file(&self) -> Result<CheckpointFile, CheckpointError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CheckpointFile::default()),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| CheckpointError::Serialize {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_file(&self, file: &CheckpointFile) -> Result<(), CheckpointError> {
        let payload =
            serde_json::to_vec_pretty(file).map_err(|source| CheckpointError::Serialize {
                path: self.path.clone(),
                source,
            })?;

        let io_err = |source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let tmp = self.sibling("tmp");
        let mut out = tokio::fs::File::create(&tmp).await.map_err(io_err)?;
        out.write_all(&payload).await.map_err(io_err)?;
        out.flush().await.map_err(io_err)?;
        out.sync_all().await.map_err(io_err)?;
        drop(out);
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;

        // Persist the rename itself. Not every platform can sync a directory.
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if let Ok(dir) = tokio::fs::File::open(parent).await {
            if let Err(e) = dir.sync_all().await {
                tracing::debug!(path = %parent.display(), error = %e, "Directory sync skipped");
            }
        }
        Ok(())
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}
