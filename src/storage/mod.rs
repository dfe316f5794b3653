//! Storage module for durable pipeline state
//!
//! This module owns everything the pipeline writes to disk:
//! - Checkpoints, behind the [`CheckpointStore`] trait (JSON files or SQLite)
//! - Sealed link batches and their manifest (`batch_index.json`)
//! - Per-batch article files and filtered batches
//!
//! Every file is written through [`write_atomic`], so an interrupted run
//! leaves either the old version or the new one behind.

mod batches;
mod checkpoint;
mod file;
mod layout;
mod schema;
mod sqlite;
mod traits;

pub use batches::{ArticleBatchStore, BatchIndex, BatchIndexEntry, LinkBatchStore, LinkBatchWriter};
pub use checkpoint::Checkpoint;
pub use file::FileCheckpointStore;
pub use layout::DataLayout;
pub use sqlite::SqliteCheckpointStore;
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::config::CheckpointBackend;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Writes `bytes` to `path` via a temp file in the same directory plus rename
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}

/// Serializes `value` as pretty JSON and writes it atomically
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &json)
}

/// Reads a JSON file, returning `Ok(None)` if it does not exist
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Opens the checkpoint store selected in the configuration
pub fn open_checkpoint_store(
    backend: CheckpointBackend,
    layout: &DataLayout,
) -> StorageResult<Arc<dyn CheckpointStore>> {
    Ok(match backend {
        CheckpointBackend::File => Arc::new(FileCheckpointStore::new(layout.checkpoints_dir())?),
        CheckpointBackend::Sqlite => Arc::new(SqliteCheckpointStore::new(&layout.database_path())?),
    })
}
