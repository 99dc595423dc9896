//! Property-based tests for classification, backoff and the notification log.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use storefront_core::notifications::{
    NewNotification, NotificationCategory, NotificationFilter, NotificationLogStore,
    NotificationType,
};
use storefront_core::{classify, ErrorKind, Failure, RetryConfig, RetryPolicy};

// =============================================================================
// Generators
// =============================================================================

/// Generates any failure an attempt can end in.
fn arb_failure() -> impl Strategy<Value = Failure> {
    let body = prop_oneof![
        Just(None),
        Just(Some(json!({ "success": false, "message": "nope" }))),
        Just(Some(json!({
            "success": false,
            "errors": [{ "field": "email", "message": "invalid" }]
        }))),
        Just(Some(json!({ "errors": { "zip": ["required"] } }))),
    ];
    prop_oneof![
        Just(Failure::Timeout),
        "[a-z ]{0,20}".prop_map(|m: String| Failure::network(m)),
        "[a-z ]{0,20}".prop_map(|m: String| Failure::other(m)),
        (400u16..600, body).prop_map(|(status, body)| Failure::response(status, body)),
    ]
}

fn arb_retry_config() -> impl Strategy<Value = RetryConfig> {
    (0u32..8, 1u64..5_000, 1u64..60_000, 1.0f64..4.0, 0u64..2_000).prop_map(
        |(max_retries, base_delay_ms, max_delay_ms, backoff_factor, max_jitter_ms)| RetryConfig {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            backoff_factor,
            max_jitter_ms,
        },
    )
}

fn arb_category() -> impl Strategy<Value = NotificationCategory> {
    prop_oneof![
        Just(NotificationCategory::Order),
        Just(NotificationCategory::System),
        Just(NotificationCategory::Promotion),
        Just(NotificationCategory::Account),
        Just(NotificationCategory::General),
    ]
}

#[derive(Debug, Clone)]
enum StoreOp {
    Add { read: bool, category: NotificationCategory },
    MarkRead(usize),
    MarkAllRead,
    Delete(usize),
    ClearAll,
}

fn arb_store_op() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        4 => (any::<bool>(), arb_category())
            .prop_map(|(read, category)| StoreOp::Add { read, category }),
        3 => (0usize..32).prop_map(StoreOp::MarkRead),
        1 => Just(StoreOp::MarkAllRead),
        3 => (0usize..32).prop_map(StoreOp::Delete),
        1 => Just(StoreOp::ClearAll),
    ]
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Classification is total: every failure maps to one of the known kinds,
    /// and the classification agrees with the kind's fixed table.
    #[test]
    fn prop_classification_is_total(failure in arb_failure()) {
        let classification = classify(&failure);
        prop_assert!(ErrorKind::ALL.contains(&classification.kind));
        prop_assert_eq!(classification, classification.kind.classification());
    }

    /// Every 5xx status is a retryable server error.
    #[test]
    fn prop_5xx_is_retryable(status in 500u16..600) {
        let classification = classify(&Failure::response(status, None));
        prop_assert_eq!(classification.kind, ErrorKind::ServerError);
        prop_assert!(classification.retryable);
    }

    /// Backoff never decreases with the attempt index and the jittered delay
    /// stays within `max_delay + max_jitter`.
    #[test]
    fn prop_backoff_is_monotonic_and_bounded(config in arb_retry_config(), seed in any::<u64>()) {
        let policy = RetryPolicy::new(config.clone());
        let retryable = ErrorKind::ServerError.classification();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut previous = std::time::Duration::ZERO;
        for attempt in 0..config.max_retries {
            let backoff = policy.backoff(attempt);
            prop_assert!(backoff >= previous);
            previous = backoff;

            let decision = policy.decide_with_rng(attempt, &retryable, &mut rng);
            prop_assert!(decision.should_retry);
            prop_assert!(decision.delay >= backoff);
            prop_assert!(decision.delay_ms() <= config.max_delay_ms + config.max_jitter_ms);
        }
        prop_assert!(
            !policy
                .decide_with_rng(config.max_retries, &retryable, &mut rng)
                .should_retry
        );
    }

    /// Non-retryable classifications never retry, whatever the config.
    #[test]
    fn prop_non_retryable_never_retries(config in arb_retry_config(), attempt in 0u32..10) {
        let policy = RetryPolicy::new(config);
        for kind in ErrorKind::ALL {
            let classification = kind.classification();
            if !classification.retryable {
                prop_assert!(!policy.decide(attempt, &classification).should_retry);
            }
        }
    }

    /// The unread counter matches a full scan after every operation.
    #[test]
    fn prop_unread_count_matches_records(ops in proptest::collection::vec(arb_store_op(), 0..64)) {
        let store = NotificationLogStore::new();
        for op in ops {
            let ids: Vec<_> = store.all().iter().map(|r| r.id).collect();
            match op {
                StoreOp::Add { read, category } => {
                    let mut new = NewNotification::new(NotificationType::Info, "title", "message")
                        .category(category);
                    if read {
                        new = new.read();
                    }
                    store.add(new);
                }
                StoreOp::MarkRead(i) => {
                    if let Some(id) = ids.get(i) {
                        prop_assert!(store.mark_read(*id));
                    }
                }
                StoreOp::MarkAllRead => store.mark_all_read(),
                StoreOp::Delete(i) => {
                    if let Some(id) = ids.get(i) {
                        prop_assert!(store.delete(*id));
                    }
                }
                StoreOp::ClearAll => store.clear_all(),
            }

            let scanned = store.all().iter().filter(|r| !r.read).count();
            prop_assert_eq!(store.unread_count(), scanned);
            prop_assert_eq!(store.filter(NotificationFilter::Unread).len(), scanned);
        }
    }
}
