use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{KeyValueStore, StoreError};
use crate::db;

/// Key-value backend on the SQLite database. The schema is migrated once in
/// [`SqliteKvStore::open`]; each call then opens its own connection on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    path: PathBuf,
}

impl SqliteKvStore {
    /// Open (and migrate) the database in the user's data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(&crate::global::db_file()?)
    }

    pub fn open(path: &Path) -> Result<Self> {
        db::init_db_at(path)?;
        info!("Recordings database at {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path.clone();
        let key = key.to_string();
        let value = tokio::task::spawn_blocking(move || {
            let conn = db::open_at(&path)?;
            db::kv_get(&conn, &key)
        })
        .await??;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db::open_at(&path)?;
            db::kv_set(&conn, &key, &value)
        })
        .await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Frame, Recording};
    use crate::store::RecordingStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_and_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteKvStore::open(&dir.path().join("test.db")).unwrap();

        assert_eq!(store.get("key").await.unwrap(), None);
        store.set("key", "value".to_string()).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_calls_do_not_migrate_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteKvStore::open(&path).unwrap();
        store.set("key", "value".to_string()).await.unwrap();

        rusqlite::Connection::open(&path)
            .unwrap()
            .execute("DROP TABLE kv_store", [])
            .unwrap();

        // Only open() creates the table, so reads now fail instead of
        // quietly recreating an empty one.
        assert!(matches!(store.get("key").await, Err(StoreError::Backend(_))));
        assert!(store.set("key", "again".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_recordings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let recording = Recording {
            id: "persisted".to_string(),
            timestamp: 1,
            alert_type: "BREATHING_ALERT".to_string(),
            frames: vec![Frame::new("img", None)],
            feed: Some("baby".to_string()),
        };

        {
            let backend = Arc::new(SqliteKvStore::open(&path).unwrap());
            let store = RecordingStore::new(backend, "@mama_bear_recordings", 20);
            store.save(recording.clone()).await.unwrap();
        }

        let backend = Arc::new(SqliteKvStore::open(&path).unwrap());
        let store = RecordingStore::new(backend, "@mama_bear_recordings", 20);
        assert_eq!(store.list().await.unwrap(), vec![recording]);
    }
}
