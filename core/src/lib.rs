//! Payment Operations Agent - Core Engine
//!
//! An autonomous control loop over live payment transaction telemetry:
//! observe a sliding window, reason about degradation patterns against
//! learned baselines, decide on and execute a remediation action under a
//! safety gate, and learn from what actually happened.
//!
//! # Architecture
//!
//! - **model**: domain types — transactions, patterns, hypotheses, actions,
//!   and the process-wide [`model::AgentState`] safety gate sits on.
//! - **clock**: time abstraction so cycles and window eviction are testable
//!   without a wall clock.
//! - **rng**: deterministic id generation for reproducible tests.
//! - **observer**: sliding-window ingestion and live statistics.
//! - **reasoner**: pattern detection against learned baselines, hypothesis
//!   generation.
//! - **decision**: candidate generation and multi-objective scoring.
//! - **executor**: action execution, rollback monitoring.
//! - **learner**: outcome tracking, threshold and weight recommendations.
//! - **orchestrator**: [`orchestrator::Engine`], which wires the above into
//!   one cycle.
//!
//! # Critical invariants
//!
//! 1. `run_cycle` never panics and never returns an `Err` — any internal
//!    failure is captured into [`orchestrator::CycleReport::error`].
//! 2. Every action passes through the same safety gate twice: once when the
//!    Decision Maker considers it, once when the Executor applies it.
//! 3. All monetary amounts are [`rust_decimal::Decimal`], never floats.

pub mod clock;
pub mod decision;
pub mod errors;
pub mod executor;
pub mod learner;
pub mod model;
pub mod observer;
pub mod orchestrator;
pub mod reasoner;
pub mod rng;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::CoreError;
pub use executor::{Alert, Executor, NoopSink, NotificationSink, TracingSink};
pub use learner::Learner;
pub use model::{
    Action, ActionParameters, ActionStatus, ActionType, AgentState, AuthorizationLevel, Dimension,
    GateViolation, Hypothesis, Impact, Money, PaymentMethod, Pattern, PatternType, RiskLevel,
    SafetyLimits, Transaction, TransactionError, TransactionStatus,
};
pub use observer::{ObservationSummary, Observer};
pub use orchestrator::{CycleReport, Engine, EngineConfig, ProductionEngine};
pub use reasoner::{Reasoner, Thresholds};
pub use rng::{DeterministicIdGenerator, IdGenerator, UuidGenerator};
