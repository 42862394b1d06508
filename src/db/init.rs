use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn init_db_at(db_path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = open_at(db_path)?;

    migrate(&conn)?;

    Ok(conn)
}

/// Open an already migrated database.
pub fn open_at(db_path: &Path) -> Result<Connection> {
    Connection::open(db_path).context("Failed to open database connection")
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create kv_store table")?;

    Ok(())
}
