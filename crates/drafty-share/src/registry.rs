//! The share registry: sole authority over share grants
//!
//! Every operation performs one store read and at most one store write.
//! Mutations hold the store's key lock from that read until the write, so
//! concurrent writers to one partition never drop each other's grants.
//! Missing grants and unauthorized requesters look the same to callers
//! (`Ok(false)` or an empty list), so grant existence never leaks.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::error::{ShareError, ShareResult};
use crate::grant::{PrincipalId, Requester, ShareGrant, SubjectId, UnixSeconds};
use crate::scope::{DEFAULT_NAMESPACE, Partition, StorageScope};
use crate::store::KeyValueStore;
use crate::token::{RandomTokenGenerator, ShareToken, TokenGenerator};

/// Fresh tokens tried by `create_share` before giving up
pub const MAX_TOKEN_ATTEMPTS: usize = 16;

/// Creates, authorizes, extends and expires share grants
pub struct ShareRegistry {
    store: Arc<dyn KeyValueStore>,
    scope: StorageScope,
    namespace: String,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
}

impl ShareRegistry {
    /// Registry over `store` using the wall clock and random tokens
    pub fn new(store: Arc<dyn KeyValueStore>, scope: StorageScope) -> Self {
        Self {
            store,
            scope,
            namespace: DEFAULT_NAMESPACE.into(),
            clock: Arc::new(SystemClock),
            tokens: Arc::new(RandomTokenGenerator::default()),
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &RegistryConfig) -> Self {
        Self::new(store, config.scope)
            .with_namespace(config.namespace.clone())
            .with_token_generator(Arc::new(RandomTokenGenerator::new(config.token_length)))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn scope(&self) -> StorageScope {
        self.scope
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Current time according to the registry's clock
    pub fn now(&self) -> UnixSeconds {
        self.clock.now()
    }

    /// Create a grant for `subject` that lapses `duration_secs` from now
    ///
    /// Regenerates the token on collision, up to [`MAX_TOKEN_ATTEMPTS`].
    pub async fn create_share(
        &self,
        owner: PrincipalId,
        subject: SubjectId,
        duration_secs: u64,
    ) -> ShareResult<ShareToken> {
        let now = self.clock.now();
        let expires_at = offset(now, duration_secs)?;

        let key = self.key_for(subject);
        let _lock = self.store.lock(&key).await?;
        let mut partition = self.load(&key).await?;

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = ShareToken::parse(&self.tokens.generate())?;
            if partition.contains(&token) {
                warn!(%subject, attempt, "Generated share token collided, retrying");
                continue;
            }

            partition.insert(ShareGrant {
                token: token.clone(),
                owner,
                subject,
                expires_at,
            });
            self.save(&key, &partition).await?;

            info!(%subject, %owner, expires_at, token = %token.redacted(), "Share created");
            return Ok(token);
        }

        Err(ShareError::TokenSpaceExhausted {
            attempts: MAX_TOKEN_ATTEMPTS,
        })
    }

    /// Grants on `subject` the requester may manage, ordered by token
    ///
    /// Expired grants that have not been deleted are included so their
    /// owners can still extend or delete them. See [`Self::list_active_shares`].
    pub async fn list_visible_shares(
        &self,
        requester: &Requester,
        subject: SubjectId,
    ) -> ShareResult<Vec<ShareGrant>> {
        let partition = self.load(&self.key_for(subject)).await?;
        Ok(partition
            .for_subject(subject)
            .filter(|g| requester.can_manage(g))
            .cloned()
            .collect())
    }

    /// Like [`Self::list_visible_shares`], without lapsed grants
    pub async fn list_active_shares(
        &self,
        requester: &Requester,
        subject: SubjectId,
    ) -> ShareResult<Vec<ShareGrant>> {
        let now = self.clock.now();
        let mut grants = self.list_visible_shares(requester, subject).await?;
        grants.retain(|g| g.is_active(now));
        Ok(grants)
    }

    /// Whether `token` currently grants access to `subject`
    ///
    /// Read-only; meant to run on every read of the protected resource.
    pub async fn share_exists(&self, subject: SubjectId, token: &ShareToken) -> ShareResult<bool> {
        let now = self.clock.now();
        let partition = self.load(&self.key_for(subject)).await?;
        let granted = partition
            .get(subject, token)
            .is_some_and(|g| g.is_active(now));
        debug!(%subject, token = %token.redacted(), granted, "Share checked");
        Ok(granted)
    }

    /// Raw lookup, expired grants included. No ownership check.
    pub async fn get_share(
        &self,
        subject: SubjectId,
        token: &ShareToken,
    ) -> ShareResult<Option<ShareGrant>> {
        let partition = self.load(&self.key_for(subject)).await?;
        Ok(partition.get(subject, token).cloned())
    }

    /// Push a grant's expiry `extra_secs` further out
    ///
    /// A lapsed grant is extended from now, not from its old expiry.
    pub async fn extend_share(
        &self,
        requester: &Requester,
        subject: SubjectId,
        token: &ShareToken,
        extra_secs: u64,
    ) -> ShareResult<bool> {
        let extra = i64::try_from(extra_secs)
            .map_err(|_| ShareError::InvalidDuration(format!("{extra_secs}s is too long")))?;

        let key = self.key_for(subject);
        let _lock = self.store.lock(&key).await?;
        let now = self.clock.now();
        let mut partition = self.load(&key).await?;

        let Some(grant) = partition.get_mut(subject, token) else {
            debug!(%subject, token = %token.redacted(), "Extend of unknown share");
            return Ok(false);
        };
        if !requester.can_manage(grant) {
            debug!(%subject, token = %token.redacted(), "Extend denied");
            return Ok(false);
        }

        let base = grant.expires_at.max(now);
        let expires_at = base
            .checked_add(extra)
            .ok_or_else(|| ShareError::InvalidDuration(format!("{extra_secs}s is too long")))?;
        grant.expires_at = expires_at;
        self.save(&key, &partition).await?;

        info!(%subject, expires_at, token = %token.redacted(), "Share extended");
        Ok(true)
    }

    /// Remove a grant permanently
    pub async fn delete_share(
        &self,
        requester: &Requester,
        subject: SubjectId,
        token: &ShareToken,
    ) -> ShareResult<bool> {
        let key = self.key_for(subject);
        let _lock = self.store.lock(&key).await?;
        let mut partition = self.load(&key).await?;

        match partition.get(subject, token) {
            Some(grant) if requester.can_manage(grant) => {}
            Some(_) => {
                debug!(%subject, token = %token.redacted(), "Delete denied");
                return Ok(false);
            }
            None => {
                debug!(%subject, token = %token.redacted(), "Delete of unknown share");
                return Ok(false);
            }
        }

        partition.remove(token);
        self.save(&key, &partition).await?;

        info!(%subject, token = %token.redacted(), "Share deleted");
        Ok(true)
    }

    /// Overwrite a grant's expiry, bypassing ownership
    ///
    /// For trusted internal callers only.
    pub async fn set_expiry(
        &self,
        subject: SubjectId,
        token: &ShareToken,
        expires_at: UnixSeconds,
    ) -> ShareResult<bool> {
        let key = self.key_for(subject);
        let _lock = self.store.lock(&key).await?;
        let mut partition = self.load(&key).await?;

        let Some(grant) = partition.get_mut(subject, token) else {
            return Ok(false);
        };
        grant.expires_at = expires_at;
        self.save(&key, &partition).await?;

        info!(%subject, expires_at, token = %token.redacted(), "Share expiry overridden");
        Ok(true)
    }

    fn key_for(&self, subject: SubjectId) -> String {
        self.scope.key_for(&self.namespace, subject)
    }

    async fn load(&self, key: &str) -> ShareResult<Partition> {
        let raw = self.store.get(key).await?;
        Partition::decode(key, raw.as_deref()).map_err(|e| {
            warn!(key, error = %e, "Share partition could not be decoded");
            e.into()
        })
    }

    async fn save(&self, key: &str, partition: &Partition) -> ShareResult<()> {
        let bytes = partition.encode(key)?;
        self.store.set(key, &bytes).await?;
        Ok(())
    }
}

fn offset(now: UnixSeconds, secs: u64) -> ShareResult<UnixSeconds> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| now.checked_add(secs))
        .ok_or_else(|| ShareError::InvalidDuration(format!("{secs}s is too long")))
}
