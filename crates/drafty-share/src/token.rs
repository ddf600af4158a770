//! Share tokens and token generation

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::error::{ShareError, ShareResult};

/// Shortest token the registry accepts
pub const MIN_TOKEN_LEN: usize = 8;

/// Length used by [`RandomTokenGenerator::default`] (~71 bits of entropy)
pub const DEFAULT_TOKEN_LEN: usize = 12;

/// Bearer credential identifying a single share grant
///
/// Always at least [`MIN_TOKEN_LEN`] ASCII alphanumeric characters.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareToken(String);

impl ShareToken {
    /// Validate and wrap a token string
    pub fn parse(s: &str) -> ShareResult<Self> {
        if s.len() < MIN_TOKEN_LEN {
            return Err(ShareError::MalformedToken(format!(
                "expected at least {MIN_TOKEN_LEN} characters, got {}",
                s.len()
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ShareError::MalformedToken(
                "tokens may only contain ASCII letters and digits".into(),
            ));
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs
    pub fn redacted(&self) -> String {
        format!("{}…", &self.0[..2])
    }
}

impl FromStr for ShareToken {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShareToken {
    type Error = ShareError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ShareToken> for String {
    fn from(token: ShareToken) -> Self {
        token.0
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of debug output.
impl fmt::Debug for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareToken({})", self.redacted())
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh token strings
///
/// Output is validated by the registry, so a generator producing short or
/// non-alphanumeric strings causes `create_share` to fail.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform random tokens over `[A-Za-z0-9]` from the thread RNG
#[derive(Clone, Debug)]
pub struct RandomTokenGenerator {
    length: usize,
}

impl RandomTokenGenerator {
    /// Lengths below [`MIN_TOKEN_LEN`] are raised to it
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(MIN_TOKEN_LEN),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomTokenGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LEN)
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}
