//! Local filesystem store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{StoreError, StoreResult};
use crate::lock::lock_file;
use crate::store::{KeyLock, KeyValueStore};

const SHARES_DIR: &str = "shares";
const LOCKS_DIR: &str = "locks";

/// One file per key under `{root}/shares/{base58(key)}`
///
/// Writes land in a temporary sibling first and are renamed into place, so
/// a concurrent reader sees either the old or the new value. Key locks are
/// advisory file locks under `{root}/locks/`, shared by every process that
/// opens the same root.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Open a store rooted at `root`, creating the directory structure
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(SHARES_DIR)).await?;
        fs::create_dir_all(root.join(LOCKS_DIR)).await?;
        Ok(Self { root })
    }

    fn file_name(key: &str) -> StoreResult<String> {
        if key.is_empty() {
            return Err(StoreError::Backend("empty store key".into()));
        }
        Ok(bs58::encode(key.as_bytes()).into_string())
    }

    fn entry_path(&self, key: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(SHARES_DIR).join(Self::file_name(key)?))
    }

    fn lock_path(&self, key: &str) -> StoreResult<PathBuf> {
        Ok(self
            .root
            .join(LOCKS_DIR)
            .join(format!("{}.lock", Self::file_name(key)?)))
    }

    /// All keys currently on disk, sorted
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(self.root.join(SHARES_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            // Skips in-flight temp files, which start with '.'
            let Ok(bytes) = bs58::decode(&name).into_vec() else {
                continue;
            };
            if let Ok(key) = String::from_utf8(bytes) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl KeyValueStore for LocalFileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.entry_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.entry_path(key)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::Backend(format!("bad path for key {key}")))?;
        let tmp = path.with_file_name(format!(".{file_name}.{:08x}.tmp", rand::random::<u32>()));

        fs::write(&tmp, value).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn lock(&self, key: &str) -> StoreResult<KeyLock> {
        lock_file(self.lock_path(key)?).await
    }
}
