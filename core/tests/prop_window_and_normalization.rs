//! Property-based coverage for the two invariants that are easiest to get
//! wrong with hand-picked examples alone: the sliding window's counters
//! staying consistent under arbitrary ingest/evict sequences, and
//! hypothesis-probability normalization always producing a valid
//! distribution regardless of the raw weights fed in.

mod common;

use chrono::Duration;
use payment_agent_core::clock::{Clock, FixedClock};
use payment_agent_core::model::{
    normalize_probabilities, Dimension, Hypothesis, Money, PaymentMethod, Transaction,
    TransactionStatus,
};
use payment_agent_core::Observer;
use proptest::prelude::*;
use rust_decimal_macros::dec;

fn txn_at(now: chrono::DateTime<chrono::Utc>, success: bool) -> Transaction {
    Transaction::builder(
        uuid::Uuid::new_v4().to_string(),
        now,
        Money { amount: dec!(10), currency: "USD".to_string() },
        PaymentMethod::Upi,
        "HDFC",
        "merchant_1",
        if success { TransactionStatus::Success } else { TransactionStatus::Failed },
    )
    .latency_ms(100.0)
    .region("us-east")
    .build()
    .unwrap()
}

fn hyp(id: usize, probability: f64) -> Hypothesis {
    Hypothesis {
        id: id.to_string(),
        pattern_id: "p".to_string(),
        root_cause: "issuer_down".to_string(),
        probability,
        supporting_evidence: vec![],
        contradicting_evidence: vec![],
        created_at: chrono::Utc::now(),
    }
}

proptest! {
    /// Ingesting any batch of successes/failures within one window, with no
    /// eviction in between, must leave `transaction_volume == batch.len()`
    /// and `success_rate` matching the fraction of successes exactly —
    /// this is what `stats[dim][key].total == success + failed` reduces to
    /// at the public API surface.
    #[test]
    fn window_volume_and_success_rate_track_an_arbitrary_batch(
        outcomes in prop::collection::vec(any::<bool>(), 0..200)
    ) {
        let clock = FixedClock::at_epoch();
        let mut observer = Observer::new(Duration::minutes(10));
        let now = clock.now();

        for &success in &outcomes {
            observer.ingest(&clock, txn_at(now, success));
        }

        let expected_successes = outcomes.iter().filter(|s| **s).count() as u64;
        let expected_total = outcomes.len() as u64;

        prop_assert_eq!(observer.transaction_volume(Dimension::Overall, ""), expected_total);
        prop_assert_eq!(observer.window_len(), outcomes.len());

        if expected_total == 0 {
            prop_assert_eq!(observer.success_rate(Dimension::Overall, ""), 1.0);
        } else {
            let expected_rate = expected_successes as f64 / expected_total as f64;
            prop_assert!((observer.success_rate(Dimension::Overall, "") - expected_rate).abs() < 1e-9);
        }
    }

    /// Once every ingested transaction has aged out of the window, the
    /// counters must return to exactly empty, no matter how large the
    /// batch was — eviction must fully reverse what ingestion recorded.
    #[test]
    fn evicting_an_entire_batch_returns_counters_to_empty(
        outcomes in prop::collection::vec(any::<bool>(), 1..200)
    ) {
        let mut clock = FixedClock::at_epoch();
        let mut observer = Observer::new(Duration::minutes(10));
        let now = clock.now();

        for &success in &outcomes {
            observer.ingest(&clock, txn_at(now, success));
        }
        clock.set(now + Duration::minutes(11));
        observer.evict_expired(&clock);

        prop_assert_eq!(observer.transaction_volume(Dimension::Overall, ""), 0);
        prop_assert_eq!(observer.window_len(), 0);
        prop_assert_eq!(observer.success_rate(Dimension::Overall, ""), 1.0);
    }

    /// `normalize_probabilities` must always leave a non-empty slice summing
    /// to 1 (modulo float error) with every probability in `[0, 1]`, for any
    /// finite non-negative raw weights — including all-zero.
    #[test]
    fn normalize_probabilities_always_sums_to_one(
        weights in prop::collection::vec(0.0f64..1000.0, 1..20)
    ) {
        let mut hyps: Vec<Hypothesis> = weights
            .into_iter()
            .enumerate()
            .map(|(i, w)| hyp(i, w))
            .collect();

        normalize_probabilities(&mut hyps);

        let sum: f64 = hyps.iter().map(|h| h.probability).sum();
        prop_assert!((sum - 1.0).abs() < 1e-6);
        for h in &hyps {
            prop_assert!(h.probability >= 0.0 && h.probability <= 1.0 + 1e-9);
        }
    }

    /// An empty slice is a no-op, for any call pattern — nothing to
    /// normalize, nothing should panic.
    #[test]
    fn normalize_probabilities_is_a_noop_on_empty(_seed in any::<u8>()) {
        let mut hyps: Vec<Hypothesis> = Vec::new();
        normalize_probabilities(&mut hyps);
        prop_assert!(hyps.is_empty());
    }
}
