//! Per-key write locks shared by the bundled stores

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fs2::FileExt;

use crate::error::{StoreError, StoreResult};
use crate::store::KeyLock;

/// In-process lock table, one async mutex per key
#[derive(Default)]
pub(crate) struct KeyMutexes {
    keys: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyMutexes {
    pub(crate) async fn lock(&self, key: &str) -> StoreResult<KeyLock> {
        let mutex = {
            let mut keys = self
                .keys
                .lock()
                .map_err(|_| StoreError::Backend("key lock table poisoned".into()))?;
            keys.entry(key.to_owned()).or_default().clone()
        };
        Ok(KeyLock::new(mutex.lock_owned().await))
    }
}

/// Advisory lock on a file, held until drop
struct LockedFile(File);

impl Drop for LockedFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

/// Take an exclusive advisory lock on `path`, creating the file if needed
///
/// Each call opens its own handle, so two handles in the same process
/// exclude each other just like two processes do.
pub(crate) async fn lock_file(path: PathBuf) -> StoreResult<KeyLock> {
    let locked = tokio::task::spawn_blocking(move || -> std::io::Result<LockedFile> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.lock_exclusive()?;
        Ok(LockedFile(file))
    })
    .await
    .map_err(|e| StoreError::Backend(format!("lock task failed: {e}")))??;
    Ok(KeyLock::new(locked))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_key_mutex_excludes_same_key_only() {
        let locks = KeyMutexes::default();
        let held = locks.lock("a").await.unwrap();

        // A different key is free
        let _other = locks.lock("b").await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.lock("a")).await;
        assert!(blocked.is_err());

        drop(held);
        let _again = locks.lock("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_lock_excludes_second_handle() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("k.lock");

        let held = lock_file(path.clone()).await.unwrap();
        let second = std::fs::File::open(&path).unwrap();
        assert!(second.try_lock_exclusive().is_err());

        drop(held);
        let _again = lock_file(path).await.unwrap();
    }
}
