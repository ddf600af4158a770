//! Property-based tests for the share registry

use std::sync::Arc;

use drafty_share::{
    InMemoryStore, ManualClock, MIN_TOKEN_LEN, PrincipalId, RandomTokenGenerator, Requester,
    ShareRegistry, ShareToken, StorageScope, SubjectId, TokenGenerator,
};
use proptest::prelude::*;

fn scope_strategy() -> impl Strategy<Value = StorageScope> {
    prop_oneof![Just(StorageScope::Global), Just(StorageScope::PerSubject)]
}

fn run<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(fut)
}

proptest! {
    /// Property: any generated token is a valid share token of the requested length
    #[test]
    fn prop_generated_tokens_are_valid(len in 0usize..64) {
        let generator = RandomTokenGenerator::new(len);
        let raw = generator.generate();
        prop_assert_eq!(raw.len(), len.max(MIN_TOKEN_LEN));
        prop_assert!(ShareToken::parse(&raw).is_ok());
    }

    /// Property: a fresh grant exists and is listed exactly once for its owner
    #[test]
    fn prop_create_then_visible(
        owner in any::<u64>(),
        subject in any::<u64>(),
        duration in 1u64..10_000_000,
        scope in scope_strategy(),
    ) {
        let (exists, listed) = run(async {
            let registry = ShareRegistry::new(Arc::new(InMemoryStore::new()), scope)
                .with_clock(Arc::new(ManualClock::new(1_700_000_000)));
            let token = registry
                .create_share(PrincipalId(owner), SubjectId(subject), duration)
                .await
                .unwrap();
            let exists = registry.share_exists(SubjectId(subject), &token).await.unwrap();
            let listed = registry
                .list_visible_shares(&Requester::user(owner), SubjectId(subject))
                .await
                .unwrap();
            (exists, listed)
        });

        prop_assert!(exists);
        prop_assert_eq!(listed.len(), 1);
        prop_assert_eq!(listed[0].owner, PrincipalId(owner));
        prop_assert_eq!(listed[0].subject, SubjectId(subject));
    }

    /// Property: extending never moves expiry earlier than now + extra
    #[test]
    fn prop_extend_counts_from_max_of_now_and_expiry(
        duration in 0u64..10_000,
        elapsed in 0i64..20_000,
        extra in 0u64..10_000,
    ) {
        let (before, after, now) = run(async {
            let clock = Arc::new(ManualClock::new(1_700_000_000));
            let registry = ShareRegistry::new(Arc::new(InMemoryStore::new()), StorageScope::Global)
                .with_clock(clock.clone());
            let token = registry
                .create_share(PrincipalId(1), SubjectId(2), duration)
                .await
                .unwrap();
            let before = registry.get_share(SubjectId(2), &token).await.unwrap().unwrap();
            clock.advance(elapsed);
            registry
                .extend_share(&Requester::user(1), SubjectId(2), &token, extra)
                .await
                .unwrap();
            let after = registry.get_share(SubjectId(2), &token).await.unwrap().unwrap();
            (before.expires_at, after.expires_at, registry.now())
        });

        prop_assert_eq!(after, before.max(now) + extra as i64);
    }
}
