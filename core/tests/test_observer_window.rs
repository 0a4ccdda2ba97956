//! Boundary behaviour of the sliding observation window: an empty window
//! reports neutral defaults rather than NaN or panicking, and each
//! detector's volume floor is a hard line — one transaction short and it
//! stays silent.

mod common;

use common::{engine, epoch};
use payment_agent_core::model::{PatternType, PaymentMethod, TransactionStatus};
use payment_agent_core::EngineConfig;

#[test]
fn empty_window_reports_neutral_defaults_and_no_patterns() {
    let mut agent = engine(EngineConfig::default());

    let report = agent.run_cycle();

    assert_eq!(report.observation_summary.total_transactions, 0);
    assert_eq!(report.observation_summary.overall_success_rate, 1.0);
    assert_eq!(report.observation_summary.overall_latency.mean, 0.0);
    assert_eq!(report.observation_summary.overall_latency.p95, 0.0);
    assert!(report.patterns_detected.is_empty());
    assert!(report.actions_taken.is_empty());
}

#[test]
fn issuer_degradation_requires_at_least_ten_transactions() {
    let mut agent = engine(EngineConfig::default());
    let now = epoch();

    for _ in 0..9 {
        agent
            .ingest(common::txn(now, "HDFC", PaymentMethod::Upi, TransactionStatus::Failed, 150.0, "us-east"))
            .unwrap();
    }

    let report = agent.run_cycle();

    assert!(
        report
            .patterns_detected
            .iter()
            .all(|p| p.pattern_type != PatternType::IssuerDegradation),
        "9 failing transactions is one below the volume floor and must not trigger"
    );
}

#[test]
fn issuer_degradation_fires_right_at_the_volume_floor() {
    let mut agent = engine(EngineConfig::default());
    let now = epoch();

    for _ in 0..10 {
        agent
            .ingest(common::txn(now, "HDFC", PaymentMethod::Upi, TransactionStatus::Failed, 150.0, "us-east"))
            .unwrap();
    }

    let report = agent.run_cycle();

    assert!(
        report
            .patterns_detected
            .iter()
            .any(|p| p.pattern_type == PatternType::IssuerDegradation && p.affected_value == "HDFC"),
        "exactly 10 failing transactions meets the volume floor and should trigger"
    );
}

#[test]
fn method_fatigue_requires_at_least_twenty_transactions() {
    let mut agent = engine(EngineConfig::default());
    let now = epoch();

    for _ in 0..19 {
        agent
            .ingest(common::txn(now, "HDFC", PaymentMethod::Upi, TransactionStatus::Failed, 150.0, "us-east"))
            .unwrap();
    }

    let report = agent.run_cycle();

    assert!(
        report
            .patterns_detected
            .iter()
            .all(|p| p.pattern_type != PatternType::MethodFatigue),
        "19 failing transactions is one below the volume floor and must not trigger"
    );
}

#[test]
fn window_eviction_drops_transactions_older_than_the_configured_size() {
    let mut agent = engine(EngineConfig {
        window_size_minutes: 10,
        ..EngineConfig::default()
    });
    let now = epoch();

    for _ in 0..10 {
        agent
            .ingest(common::txn(now, "HDFC", PaymentMethod::Upi, TransactionStatus::Failed, 150.0, "us-east"))
            .unwrap();
    }
    assert_eq!(agent.observer.window_len(), 10);

    agent.clock_mut().set(now + chrono::Duration::minutes(11));
    agent
        .ingest(common::txn(now + chrono::Duration::minutes(11), "HDFC", PaymentMethod::Upi, TransactionStatus::Success, 150.0, "us-east"))
        .unwrap();

    assert_eq!(
        agent.observer.window_len(),
        1,
        "the ten stale failures should have been evicted, leaving only the fresh success"
    );
}
