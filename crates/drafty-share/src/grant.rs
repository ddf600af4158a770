//! Share grants: records of time-limited access to one subject

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::token::ShareToken;

/// Unix timestamp in seconds
pub type UnixSeconds = i64;

/// Identifier of the principal (user) acting on the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub u64);

/// Identifier of the protected resource, e.g. a document id
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub u64);

macro_rules! id_impls {
    ($ty:ident) => {
        impl From<u64> for $ty {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $ty {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

id_impls!(PrincipalId);
id_impls!(SubjectId);

/// One outstanding share
///
/// Only `expires_at` ever changes after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub token: ShareToken,
    pub owner: PrincipalId,
    pub subject: SubjectId,
    pub expires_at: UnixSeconds,
}

impl ShareGrant {
    /// Still grants access at `now` (strictly before expiry)
    pub fn is_active(&self, now: UnixSeconds) -> bool {
        self.expires_at > now
    }

    pub fn is_owned_by(&self, principal: PrincipalId) -> bool {
        self.owner == principal
    }

    /// Seconds left before expiry, zero once lapsed
    pub fn remaining(&self, now: UnixSeconds) -> u64 {
        u64::try_from(self.expires_at.saturating_sub(now)).unwrap_or(0)
    }
}

/// Who is asking, and whether they may bypass ownership checks
///
/// `privileged` comes from the host's permission model; the registry has no
/// notion of roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requester {
    pub id: Option<PrincipalId>,
    pub privileged: bool,
}

impl Requester {
    /// An ordinary user, limited to grants they own
    pub fn user(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: Some(id.into()),
            privileged: false,
        }
    }

    /// A user allowed to manage every grant
    pub fn privileged(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: Some(id.into()),
            privileged: true,
        }
    }

    /// Internal caller with no principal of its own
    pub fn system() -> Self {
        Self {
            id: None,
            privileged: true,
        }
    }

    pub fn new(id: impl Into<PrincipalId>, privileged: bool) -> Self {
        Self {
            id: Some(id.into()),
            privileged,
        }
    }

    /// May see, extend or delete `grant`
    pub fn can_manage(&self, grant: &ShareGrant) -> bool {
        self.privileged || self.id.is_some_and(|id| grant.is_owned_by(id))
    }
}
