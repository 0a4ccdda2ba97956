//! Shared scaffolding for the end-to-end scenario tests.

use chrono::{DateTime, Utc};
use payment_agent_core::clock::{Clock, FixedClock};
use payment_agent_core::executor::NoopSink;
use payment_agent_core::model::{Money, PaymentMethod, Transaction, TransactionStatus};
use payment_agent_core::rng::DeterministicIdGenerator;
use payment_agent_core::{Engine, EngineConfig};
use rust_decimal_macros::dec;

pub type TestEngine = Engine<FixedClock, DeterministicIdGenerator, NoopSink>;

pub fn engine(config: EngineConfig) -> TestEngine {
    Engine::new(config, FixedClock::at_epoch(), DeterministicIdGenerator::new(11), NoopSink)
}

#[allow(clippy::too_many_arguments)]
pub fn txn(
    now: DateTime<Utc>,
    issuer: &str,
    method: PaymentMethod,
    status: TransactionStatus,
    latency_ms: f64,
    region: &str,
) -> Transaction {
    Transaction::builder(
        uuid::Uuid::new_v4().to_string(),
        now,
        Money {
            amount: dec!(25),
            currency: "USD".to_string(),
        },
        method,
        issuer,
        "merchant_1",
        status,
    )
    .latency_ms(latency_ms)
    .region(region)
    .build()
    .unwrap()
}

pub fn epoch() -> DateTime<Utc> {
    FixedClock::at_epoch().now()
}
