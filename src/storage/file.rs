use crate::storage::layout::batch_file_name;
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::{write_json_atomic, Checkpoint};
use std::path::PathBuf;

/// One JSON file per batch under a checkpoint directory
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Opens (and creates if needed) a checkpoint directory
    pub fn new(dir: PathBuf) -> StorageResult<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, batch_id: u32) -> PathBuf {
        self.dir.join(batch_file_name("checkpoint", batch_id, "json"))
    }

    fn batch_id_of(name: &str) -> Option<u32> {
        name.strip_prefix("checkpoint_batch_")?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self, batch_id: u32) -> StorageResult<Option<Checkpoint>> {
        let bytes = match std::fs::read(self.path_for(batch_id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let checkpoint: Checkpoint =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
                batch_id,
                reason: e.to_string(),
            })?;

        if checkpoint.batch_id != batch_id {
            return Err(StorageError::Corrupt {
                batch_id,
                reason: format!("file holds checkpoint for batch {}", checkpoint.batch_id),
            });
        }

        Ok(Some(checkpoint))
    }

    fn save(&self, checkpoint: &Checkpoint) -> StorageResult<()> {
        write_json_atomic(&self.path_for(checkpoint.batch_id), checkpoint)
    }

    fn list(&self) -> StorageResult<Vec<Checkpoint>> {
        let mut ids: Vec<u32> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| Self::batch_id_of(&entry.file_name().to_string_lossy()))
            .collect();
        ids.sort_unstable();

        let mut checkpoints = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load(id) {
                Ok(Some(checkpoint)) => checkpoints.push(checkpoint),
                Ok(None) => {}
                Err(StorageError::Corrupt { batch_id, reason }) => {
                    tracing::warn!(batch = batch_id, "Skipping corrupt checkpoint: {}", reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(checkpoints)
    }

    fn clear(&self) -> StorageResult<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }
}
