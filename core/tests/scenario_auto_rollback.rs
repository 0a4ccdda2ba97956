//! A circuit breaker that makes overall health worse, not better, should be
//! detected and reversed on the very next cycle.

mod common;

use common::{engine, epoch};
use payment_agent_core::model::{Money, PaymentMethod, Transaction, TransactionStatus};
use payment_agent_core::EngineConfig;
use rust_decimal_macros::dec;

fn txn(
    now: chrono::DateTime<chrono::Utc>,
    issuer: &str,
    status: TransactionStatus,
) -> Transaction {
    Transaction::builder(
        uuid::Uuid::new_v4().to_string(),
        now,
        Money {
            amount: dec!(25),
            currency: "USD".to_string(),
        },
        PaymentMethod::CreditCard,
        issuer,
        "merchant_1",
        status,
    )
    .latency_ms(120.0)
    .region("us-east")
    .build()
    .unwrap()
}

#[test]
fn worsening_overall_health_rolls_back_the_circuit_breaker() {
    let mut agent = engine(EngineConfig::default());
    let now = epoch();

    // A large healthy HDFC population keeps overall health high even
    // though ICICI alone is badly degraded.
    for _ in 0..400 {
        agent.ingest(txn(now, "HDFC", TransactionStatus::Success)).unwrap();
    }
    for _ in 0..60 {
        agent.ingest(txn(now, "ICICI", TransactionStatus::Failed)).unwrap();
    }

    let first = agent.run_cycle();
    assert!(
        agent.state.active_circuit_breakers.contains("ICICI"),
        "expected a circuit breaker on ICICI, got actions: {:?}",
        first.actions_taken
    );
    let baseline_success = first.observation_summary.overall_success_rate;

    // A broad new wave of HDFC failures drags overall health down well
    // past the 5% rollback threshold, without evicting the prior window.
    for _ in 0..300 {
        agent.ingest(txn(now, "HDFC", TransactionStatus::Failed)).unwrap();
    }

    let second = agent.run_cycle();
    assert!(second.observation_summary.overall_success_rate < baseline_success - 0.05);

    assert!(!agent.state.active_circuit_breakers.contains("ICICI"));
    assert_eq!(agent.state.rollbacks_last_hour, 1);
    assert!(second
        .rollbacks_executed
        .iter()
        .any(|r| r.contains("Success rate dropped")));
}
