//! Storage traits and error types
//!
//! The batch processor talks to checkpoints only through [`CheckpointStore`],
//! so the file and SQLite backends are interchangeable.

use crate::storage::Checkpoint;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A checkpoint exists but cannot be read back
    #[error("Corrupt checkpoint for batch {batch_id}: {reason}")]
    Corrupt { batch_id: u32, reason: String },

    #[error("Link batch {0} not found")]
    MissingBatch(u32),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable per-batch progress
///
/// Implementations must make `save` atomic: a reader sees either the previous
/// checkpoint or the new one, never a partial write.
pub trait CheckpointStore: Send + Sync {
    /// Loads the checkpoint for a batch
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - No checkpoint was ever written for this batch
    /// * `Err(StorageError::Corrupt)` - A checkpoint exists but is unreadable
    fn load(&self, batch_id: u32) -> StorageResult<Option<Checkpoint>>;

    /// Replaces the checkpoint for `checkpoint.batch_id`
    fn save(&self, checkpoint: &Checkpoint) -> StorageResult<()>;

    /// Every readable checkpoint, ordered by batch id
    ///
    /// Corrupt entries are skipped with a warning.
    fn list(&self) -> StorageResult<Vec<Checkpoint>>;

    /// Removes every checkpoint (used when links are re-collected from scratch)
    fn clear(&self) -> StorageResult<()>;
}
