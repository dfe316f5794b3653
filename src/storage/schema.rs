//! Database schema for the SQLite checkpoint arena

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per link batch; `body` holds the full checkpoint as JSON
CREATE TABLE IF NOT EXISTS checkpoints (
    batch_id INTEGER PRIMARY KEY,
    status TEXT NOT NULL,
    total_links INTEGER NOT NULL,
    last_processed_index INTEGER NOT NULL,
    failed_count INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    body TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_checkpoints_status ON checkpoints(status);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
