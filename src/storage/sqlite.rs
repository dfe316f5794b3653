//! SQLite checkpoint arena
//!
//! All checkpoints live in one database file. Each save is a single
//! upsert, which SQLite applies atomically.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::Checkpoint;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite checkpoint backend
pub struct SqliteCheckpointStore {
    conn: Mutex<Connection>,
}

impl SqliteCheckpointStore {
    /// Opens or creates the checkpoint database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn decode(batch_id: u32, body: &str) -> StorageResult<Checkpoint> {
        serde_json::from_str(body).map_err(|e| StorageError::Corrupt {
            batch_id,
            reason: e.to_string(),
        })
    }
}

impl CheckpointStore for SqliteCheckpointStore {
    fn load(&self, batch_id: u32) -> StorageResult<Option<Checkpoint>> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM checkpoints WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| Self::decode(batch_id, &body)).transpose()
    }

    fn save(&self, checkpoint: &Checkpoint) -> StorageResult<()> {
        let body = serde_json::to_string(checkpoint)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO checkpoints
                (batch_id, status, total_links, last_processed_index, failed_count, updated_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(batch_id) DO UPDATE SET
                status = excluded.status,
                total_links = excluded.total_links,
                last_processed_index = excluded.last_processed_index,
                failed_count = excluded.failed_count,
                updated_at = excluded.updated_at,
                body = excluded.body",
            params![
                checkpoint.batch_id,
                checkpoint.status.to_db_string(),
                checkpoint.total_links as i64,
                checkpoint.last_processed_index as i64,
                checkpoint.failed_urls.len() as i64,
                checkpoint.updated_at.to_rfc3339(),
                body
            ],
        )?;
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<Checkpoint>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT batch_id, body FROM checkpoints ORDER BY batch_id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut checkpoints = Vec::with_capacity(rows.len());
        for (batch_id, body) in rows {
            match Self::decode(batch_id, &body) {
                Ok(checkpoint) => checkpoints.push(checkpoint),
                Err(e) => tracing::warn!(batch = batch_id, "Skipping corrupt checkpoint: {}", e),
            }
        }
        Ok(checkpoints)
    }

    fn clear(&self) -> StorageResult<()> {
        self.conn()?.execute("DELETE FROM checkpoints", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::link;
    use crate::model::LinkBatch;
    use crate::state::{BatchStatus, FailedUrl, FailureKind};

    fn checkpoint(id: u32) -> Checkpoint {
        Checkpoint::new(&LinkBatch {
            id,
            links: vec![link("https://a.hr/1/"), link("https://a.hr/2/")],
        })
    }

    #[test]
    fn test_save_and_load() {
        let store = SqliteCheckpointStore::new_in_memory().unwrap();
        assert!(store.load(1).unwrap().is_none());

        let mut cp = checkpoint(1);
        cp.failed_urls.push(FailedUrl {
            url: "https://a.hr/1/".to_string(),
            index: 0,
            error: FailureKind::HttpError { status: 503 },
            attempts: 5,
        });
        store.save(&cp).unwrap();

        assert_eq!(store.load(1).unwrap(), Some(cp));
    }

    #[test]
    fn test_save_replaces_existing() {
        let store = SqliteCheckpointStore::new_in_memory().unwrap();
        let mut cp = checkpoint(1);
        store.save(&cp).unwrap();

        cp.last_processed_index = 2;
        cp.status = BatchStatus::Completed;
        store.save(&cp).unwrap();

        let loaded = store.load(1).unwrap().unwrap();
        assert!(loaded.is_completed());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_body() {
        let store = SqliteCheckpointStore::new_in_memory().unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO checkpoints VALUES (9, 'in_progress', 1, 0, 0, 'now', 'nope')",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.load(9),
            Err(StorageError::Corrupt { batch_id: 9, .. })
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.db");
        {
            let store = SqliteCheckpointStore::new(&path).unwrap();
            store.save(&checkpoint(5)).unwrap();
        }
        let reopened = SqliteCheckpointStore::new(&path).unwrap();
        assert_eq!(reopened.load(5).unwrap().map(|c| c.batch_id), Some(5));

        reopened.clear().unwrap();
        assert!(reopened.list().unwrap().is_empty());
    }
}
