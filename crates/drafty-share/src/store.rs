//! Key-value store abstraction the registry persists through

use std::any::Any;

use async_trait::async_trait;

use crate::error::StoreResult;

/// Byte-oriented key-value store supplied by the host
///
/// The registry reads a whole partition, modifies it and writes it back
/// while holding the guard returned by [`KeyValueStore::lock`]. Every
/// writer to a key must go through that lock; the bundled stores make it
/// exclusive across all handles opened on the same data.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, `None` if absent
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Wait for exclusive write access to `key`
    ///
    /// Released when the returned guard is dropped. `get` and `set` do not
    /// take the lock themselves, so readers never block.
    async fn lock(&self, key: &str) -> StoreResult<KeyLock>;
}

/// Exclusive hold on one store key, released on drop
#[must_use = "the key is unlocked as soon as the guard is dropped"]
pub struct KeyLock {
    _guard: Box<dyn Any + Send>,
}

impl KeyLock {
    /// Wrap whatever keeps the backend's lock alive
    pub fn new<G: Send + 'static>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl std::fmt::Debug for KeyLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLock").finish_non_exhaustive()
    }
}
