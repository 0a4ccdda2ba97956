//! Properties that must hold regardless of the specific scenario: the
//! cycle loop never panics or fails, determinism holds given an identical
//! seed, and gated actions never leave state mutated.

mod common;

use common::{engine, epoch};
use payment_agent_core::model::{Money, PaymentMethod, Transaction, TransactionStatus};
use payment_agent_core::rng::DeterministicIdGenerator;
use payment_agent_core::{Engine, EngineConfig};
use rust_decimal_macros::dec;

fn chaotic_batch(now: chrono::DateTime<chrono::Utc>) -> Vec<Transaction> {
    let issuers = ["HDFC", "ICICI", "SBI", "AXIS"];
    let methods = [PaymentMethod::Upi, PaymentMethod::CreditCard, PaymentMethod::NetBanking];
    let mut batch = Vec::new();
    for i in 0..200u64 {
        let issuer = issuers[(i % issuers.len() as u64) as usize];
        let method = methods[(i % methods.len() as u64) as usize];
        let status = if i % 3 == 0 { TransactionStatus::Failed } else { TransactionStatus::Success };
        batch.push(
            Transaction::builder(
                uuid::Uuid::new_v4().to_string(),
                now,
                Money {
                    amount: dec!(10),
                    currency: "USD".to_string(),
                },
                method,
                issuer,
                "merchant_1",
                status,
            )
            .latency_ms(100.0 + (i % 50) as f64)
            .region("us-east")
            .is_retry(i % 5 == 0)
            .build()
            .unwrap(),
        );
    }
    batch
}

#[test]
fn run_cycle_never_panics_or_errors_across_many_chaotic_cycles() {
    let mut agent = engine(EngineConfig::default());
    let now = epoch();

    for cycle in 0..20 {
        agent.ingest_batch(chaotic_batch(now + chrono::Duration::minutes(cycle))).unwrap();
        let report = agent.run_cycle();
        assert!(report.error.is_none(), "cycle {cycle} reported an internal error: {:?}", report.error);
    }
}

#[test]
fn run_cycle_on_an_empty_engine_never_panics_or_errors() {
    let mut agent = engine(EngineConfig::default());
    let report = agent.run_cycle();
    assert!(report.error.is_none());
}

#[test]
fn identical_inputs_with_the_same_seed_produce_identical_decisions() {
    let now = epoch();
    let batch = chaotic_batch(now);

    let mut a = engine(EngineConfig::default());
    let mut b = Engine::new(
        EngineConfig::default(),
        payment_agent_core::clock::FixedClock::at_epoch(),
        DeterministicIdGenerator::new(11),
        payment_agent_core::executor::NoopSink,
    );

    a.ingest_batch(batch.clone()).unwrap();
    b.ingest_batch(batch).unwrap();

    let report_a = a.run_cycle();
    let report_b = b.run_cycle();

    assert_eq!(report_a.patterns_detected.len(), report_b.patterns_detected.len());
    assert_eq!(
        report_a.actions_taken.iter().map(|a| (a.action_type, a.target.clone())).collect::<Vec<_>>(),
        report_b.actions_taken.iter().map(|a| (a.action_type, a.target.clone())).collect::<Vec<_>>(),
    );
    assert_eq!(report_a.observation_summary.overall_success_rate, report_b.observation_summary.overall_success_rate);
}

#[test]
fn a_blocked_action_never_mutates_state_and_never_appears_in_actions_taken() {
    let mut agent = engine(EngineConfig::default());
    agent.state.rollbacks_last_hour = 10;
    let now = epoch();

    for _ in 0..60 {
        agent
            .ingest(common::txn(now, "HDFC", PaymentMethod::Upi, TransactionStatus::Failed, 150.0, "us-east"))
            .unwrap();
    }

    let before = agent.state.clone();
    let report = agent.run_cycle();

    assert!(report.actions_taken.iter().all(|a| a.target != "HDFC"));
    assert_eq!(agent.state.active_circuit_breakers, before.active_circuit_breakers);
    assert_eq!(agent.state.retry_strategies, before.retry_strategies);
    assert_eq!(agent.state.routing_overrides, before.routing_overrides);
}
