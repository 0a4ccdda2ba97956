//! A steady stream of successful, low-latency transactions across issuers
//! should never trigger a pattern, an action, or a rollback.

mod common;

use common::{engine, epoch};
use payment_agent_core::model::{PaymentMethod, TransactionStatus};
use payment_agent_core::EngineConfig;

#[test]
fn healthy_traffic_produces_no_patterns_or_actions() {
    let mut agent = engine(EngineConfig::default());
    let now = epoch();

    for i in 0..200 {
        let issuer = if i % 2 == 0 { "HDFC" } else { "ICICI" };
        let method = if i % 3 == 0 { PaymentMethod::Upi } else { PaymentMethod::CreditCard };
        agent
            .ingest(common::txn(now, issuer, method, TransactionStatus::Success, 120.0, "us-east"))
            .unwrap();
    }

    let report = agent.run_cycle();

    assert!(report.error.is_none());
    assert!(report.patterns_detected.is_empty());
    assert!(report.actions_taken.is_empty());
    assert!(report.rollbacks_executed.is_empty());
    assert!(report.observation_summary.overall_success_rate > 0.99);
}

#[test]
fn repeated_healthy_cycles_never_accumulate_active_interventions() {
    let mut agent = engine(EngineConfig::default());
    let now = epoch();

    for _ in 0..3 {
        for _ in 0..50 {
            agent
                .ingest(common::txn(now, "HDFC", PaymentMethod::Upi, TransactionStatus::Success, 100.0, "us-east"))
                .unwrap();
        }
        agent.run_cycle();
    }

    assert!(agent.executor.active_interventions().is_empty());
}
