pub mod access;
pub mod share;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use drafty_share::{
    InMemoryStore, KeyValueStore, LocalFileStore, PrincipalId, Requester, ShareRegistry,
};

use crate::config::{Config, StoreConfig};

/// Global context passed to all commands
pub struct Context {
    pub registry: ShareRegistry,
    pub user: Option<PrincipalId>,
    pub privileged: bool,
    pub json_output: bool,
}

impl Context {
    pub async fn new(
        config: &Config,
        user: Option<PrincipalId>,
        privileged: bool,
        json_output: bool,
    ) -> Result<Self> {
        let store = open_store(&config.store).await?;
        tracing::debug!(
            backend = %config.store.backend,
            scope = %config.registry.scope,
            "Share registry ready"
        );

        Ok(Self {
            registry: ShareRegistry::from_config(store, &config.registry),
            user,
            privileged,
            json_output,
        })
    }

    /// The acting principal, required for owner-scoped commands
    pub fn require_user(&self) -> Result<PrincipalId> {
        self.user
            .ok_or_else(|| anyhow::anyhow!("No user given. Pass --user or set DRAFTY_USER"))
    }

    /// Requester for management commands
    ///
    /// Privileged callers may omit `--user`; everyone else must name themselves.
    pub fn requester(&self) -> Result<Requester> {
        match (self.user, self.privileged) {
            (None, true) => Ok(Requester::system()),
            _ => Ok(Requester::new(self.require_user()?, self.privileged)),
        }
    }
}

/// Build the configured store backend
///
/// Never falls back to another backend when the requested one is unavailable.
async fn open_store(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend.to_lowercase().as_str() {
        "memory" => {
            tracing::warn!("Using in-memory store, shares will not outlive this process");
            Ok(Arc::new(InMemoryStore::new()))
        }
        "local" => {
            let dir = config.local_dir()?;
            let store = LocalFileStore::new(&dir)
                .await
                .with_context(|| format!("Failed to open store at {}", dir.display()))?;
            Ok(Arc::new(store))
        }
        "sqlite" => open_sqlite(config),
        other => anyhow::bail!(
            "Unknown store backend '{}'. Valid options: 'memory', 'local', 'sqlite'",
            other
        ),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>> {
    let path = config.sqlite_file()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = drafty_share::SqliteStore::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>> {
    anyhow::bail!("SQLite backend requested but drafty was built without the `sqlite` feature")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_context(user: Option<u64>, privileged: bool) -> Context {
        let config = Config {
            store: StoreConfig {
                backend: "memory".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        Context::new(&config, user.map(Into::into), privileged, false)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_requester_resolution() {
        let ctx = memory_context(Some(3), false).await;
        assert_eq!(ctx.requester().unwrap(), Requester::user(3));

        let ctx = memory_context(None, true).await;
        assert_eq!(ctx.requester().unwrap(), Requester::system());

        let ctx = memory_context(None, false).await;
        assert!(ctx.requester().is_err());
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let config = StoreConfig {
            backend: "s3".into(),
            ..Default::default()
        };
        assert!(open_store(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_local_backend_in_tempdir() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = StoreConfig {
            backend: "local".into(),
            local_path: Some(temp.path().display().to_string()),
            sqlite_path: None,
        };
        let store = open_store(&config).await.unwrap();
        store.set("drafty", b"{}").await.unwrap();
        assert!(store.get("drafty").await.unwrap().is_some());
    }
}
