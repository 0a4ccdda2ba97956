//! A pattern severe enough to warrant intervention must still be blocked
//! when the rollback-rate safety gate is already tripped, and blocking it
//! must not mutate any state.

mod common;

use common::{engine, epoch};
use payment_agent_core::model::{PaymentMethod, TransactionStatus};
use payment_agent_core::EngineConfig;

#[test]
fn tripped_rollback_gate_blocks_the_action_with_no_state_mutation() {
    let mut agent = engine(EngineConfig::default());
    agent.state.rollbacks_last_hour = 10;
    let now = epoch();

    for _ in 0..60 {
        agent
            .ingest(common::txn(now, "HDFC", PaymentMethod::Upi, TransactionStatus::Failed, 150.0, "us-east"))
            .unwrap();
    }
    for _ in 0..60 {
        agent
            .ingest(common::txn(now, "ICICI", PaymentMethod::Upi, TransactionStatus::Success, 150.0, "us-east"))
            .unwrap();
    }

    let report = agent.run_cycle();

    assert!(!report.patterns_detected.is_empty(), "pattern should still be detected");
    assert!(
        report.actions_taken.iter().all(|a| a.target != "HDFC"),
        "a blocked action must not appear in actions_taken"
    );
    assert!(!agent.state.active_circuit_breakers.contains("HDFC"));
    assert!(agent.state.retry_strategies.is_empty());
    assert!(agent.state.routing_overrides.is_empty());
}
