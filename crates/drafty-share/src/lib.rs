//! drafty-share: Time-limited share links for unpublished content
//!
//! An editor creates a share grant for a subject (e.g. a draft document)
//! and hands out its random token. Anyone presenting the token can read the
//! subject until the grant lapses. The [`ShareRegistry`] owns every grant
//! and enforces ownership and expiry; persistence goes through a host
//! supplied [`KeyValueStore`].
//!
//! ## Backends
//!
//! | Backend          | Use Case                    | Feature Flag |
//! |------------------|-----------------------------|--------------|
//! | `InMemoryStore`  | Unit tests, ephemeral hosts | (always)     |
//! | `LocalFileStore` | Single-host deployments     | (always)     |
//! | `SqliteStore`    | SQLite persistence          | `sqlite`     |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use drafty_share::{InMemoryStore, Requester, ShareRegistry, StorageScope};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ShareRegistry::new(Arc::new(InMemoryStore::new()), StorageScope::Global);
//!
//!     let token = registry.create_share(1.into(), 2.into(), 3600).await?;
//!     assert!(registry.share_exists(2.into(), &token).await?);
//!
//!     registry.delete_share(&Requester::user(1), 2.into(), &token).await?;
//!     Ok(())
//! }
//! ```

mod clock;
mod config;
mod error;
mod grant;
mod local;
mod lock;
mod memory;
mod registry;
mod scope;
mod store;
mod token;

pub mod policy;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RegistryConfig;
pub use error::{ShareError, ShareResult, StoreError, StoreResult};
pub use grant::{PrincipalId, Requester, ShareGrant, SubjectId, UnixSeconds};
pub use local::LocalFileStore;
pub use memory::InMemoryStore;
pub use policy::{ShareDuration, SubjectStatus, TimeUnit, describe_expiry};
pub use registry::{MAX_TOKEN_ATTEMPTS, ShareRegistry};
pub use scope::{DEFAULT_NAMESPACE, StorageScope};
pub use store::{KeyLock, KeyValueStore};
pub use token::{
    DEFAULT_TOKEN_LEN, MIN_TOKEN_LEN, RandomTokenGenerator, ShareToken, TokenGenerator,
};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
