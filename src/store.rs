//! Durable key-value storage for the score ledger.
//!
//! The engine only needs "load the whole map" and "persist the whole map";
//! anything from a JSON file to a database row per participant satisfies the
//! contract.

use crate::types::{ParticipantId, ScoreEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("score store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("score store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn load(&self) -> StoreResult<HashMap<ParticipantId, ScoreEntry>>;
    async fn persist(&self, entries: &HashMap<ParticipantId, ScoreEntry>) -> StoreResult<()>;
}

/// JSON-file-backed store. Writes go to a sibling temp file followed by a
/// rename, so a crash mid-write never corrupts the ledger.
pub struct JsonScoreStore {
    path: PathBuf,
}

impl JsonScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScoreStore for JsonScoreStore {
    async fn load(&self) -> StoreResult<HashMap<ParticipantId, ScoreEntry>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, entries: &HashMap<ParticipantId, ScoreEntry>) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(entries)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryScoreStore {
    entries: RwLock<HashMap<ParticipantId, ScoreEntry>>,
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn load(&self) -> StoreResult<HashMap<ParticipantId, ScoreEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn persist(&self, entries: &HashMap<ParticipantId, ScoreEntry>) -> StoreResult<()> {
        *self.entries.write().await = entries.clone();
        Ok(())
    }
}
