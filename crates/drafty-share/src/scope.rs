//! Storage scope strategy and partition encoding
//!
//! A partition is the set of grants stored under one store key. Global scope
//! keeps every grant in a single partition; per-subject scope gives each
//! subject its own. Both encode a partition as a JSON object keyed by token.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::grant::{PrincipalId, ShareGrant, SubjectId, UnixSeconds};
use crate::token::ShareToken;

/// Store key prefix used unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "drafty";

/// How grants are partitioned across store keys
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageScope {
    /// All grants in one collection keyed by token
    #[default]
    Global,
    /// One collection per subject
    PerSubject,
}

impl StorageScope {
    /// Store key holding the grants of `subject`
    pub fn key_for(&self, namespace: &str, subject: SubjectId) -> String {
        match self {
            StorageScope::Global => namespace.to_owned(),
            StorageScope::PerSubject => format!("{namespace}:subject:{subject}"),
        }
    }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageScope::Global => f.write_str("global"),
            StorageScope::PerSubject => f.write_str("per_subject"),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredGrant {
    owner: PrincipalId,
    subject: SubjectId,
    expires_at: UnixSeconds,
}

/// Grants decoded from one store key, ordered by token
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Partition {
    grants: BTreeMap<ShareToken, ShareGrant>,
}

impl Partition {
    pub(crate) fn decode(key: &str, raw: Option<&[u8]>) -> StoreResult<Self> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let stored: BTreeMap<ShareToken, StoredGrant> =
            serde_json::from_slice(raw).map_err(|e| StoreError::Corrupt {
                key: key.to_owned(),
                reason: e.to_string(),
            })?;

        let grants = stored
            .into_iter()
            .map(|(token, g)| {
                let grant = ShareGrant {
                    token: token.clone(),
                    owner: g.owner,
                    subject: g.subject,
                    expires_at: g.expires_at,
                };
                (token, grant)
            })
            .collect();
        Ok(Self { grants })
    }

    pub(crate) fn encode(&self, key: &str) -> StoreResult<Vec<u8>> {
        let stored: BTreeMap<&ShareToken, StoredGrant> = self
            .grants
            .iter()
            .map(|(token, g)| {
                (
                    token,
                    StoredGrant {
                        owner: g.owner,
                        subject: g.subject,
                        expires_at: g.expires_at,
                    },
                )
            })
            .collect();
        serde_json::to_vec(&stored).map_err(|e| StoreError::Corrupt {
            key: key.to_owned(),
            reason: e.to_string(),
        })
    }

    pub(crate) fn contains(&self, token: &ShareToken) -> bool {
        self.grants.contains_key(token)
    }

    /// The grant for `token`, only if it belongs to `subject`
    pub(crate) fn get(&self, subject: SubjectId, token: &ShareToken) -> Option<&ShareGrant> {
        self.grants.get(token).filter(|g| g.subject == subject)
    }

    pub(crate) fn get_mut(
        &mut self,
        subject: SubjectId,
        token: &ShareToken,
    ) -> Option<&mut ShareGrant> {
        self.grants.get_mut(token).filter(|g| g.subject == subject)
    }

    pub(crate) fn insert(&mut self, grant: ShareGrant) {
        self.grants.insert(grant.token.clone(), grant);
    }

    pub(crate) fn remove(&mut self, token: &ShareToken) -> Option<ShareGrant> {
        self.grants.remove(token)
    }

    pub(crate) fn for_subject(&self, subject: SubjectId) -> impl Iterator<Item = &ShareGrant> {
        self.grants.values().filter(move |g| g.subject == subject)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.grants.len()
    }
}
