//! Registry configuration

use serde::Deserialize;

use crate::scope::{DEFAULT_NAMESPACE, StorageScope};
use crate::token::DEFAULT_TOKEN_LEN;

/// Construction-time settings for a [`ShareRegistry`](crate::ShareRegistry)
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    #[serde(default)]
    pub scope: StorageScope,
    /// Prefix of every store key the registry writes
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_token_length")]
    pub token_length: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            scope: StorageScope::default(),
            namespace: default_namespace(),
            token_length: default_token_length(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.into()
}
fn default_token_length() -> usize {
    DEFAULT_TOKEN_LEN
}
