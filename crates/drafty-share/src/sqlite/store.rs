//! SQLite key-value store

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};

use super::schema::init_schema;
use crate::error::{StoreError, StoreResult};
use crate::lock::{KeyMutexes, lock_file};
use crate::store::{KeyLock, KeyValueStore};

/// SQLite-backed key-value store
///
/// A single connection behind a mutex, so each `get` and `set` is serialized
/// within the process. A file database locks writers through an advisory
/// `{path}.lock` sidecar covering every key; an in-memory one locks per key.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    lock_path: Option<PathBuf>,
    locks: KeyMutexes,
}

impl SqliteStore {
    /// Open or create a database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        init_schema(&conn)?;

        let mut lock_name = OsString::from(path.as_os_str());
        lock_name.push(".lock");
        Ok(Self {
            conn: Mutex::new(conn),
            lock_path: Some(PathBuf::from(lock_name)),
            locks: KeyMutexes::default(),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            lock_path: None,
            locks: KeyMutexes::default(),
        })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("sqlite connection lock poisoned".into()))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, chrono::Utc::now().timestamp()),
        )?;
        Ok(())
    }

    async fn lock(&self, key: &str) -> StoreResult<KeyLock> {
        match &self.lock_path {
            Some(path) => lock_file(path.clone()).await,
            None => self.locks.lock(key).await,
        }
    }
}
