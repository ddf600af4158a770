//! Registry and store error types

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;
pub type ShareResult<T> = Result<T, ShareError>;

/// Failures raised by a [`KeyValueStore`](crate::KeyValueStore) backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt value at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Store backend error: {0}")]
    Backend(String),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Failures raised by the share registry
///
/// "Not found" and "not authorized" are deliberately absent: mutating
/// operations report both as `Ok(false)`.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Unknown subject status: {0}")]
    UnknownStatus(String),

    #[error("Could not generate a unique token after {attempts} attempts")]
    TokenSpaceExhausted { attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ShareError {
    /// True for errors caused by the caller passing bad input
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            ShareError::InvalidDuration(_)
                | ShareError::MalformedToken(_)
                | ShareError::UnknownStatus(_)
        )
    }
}
