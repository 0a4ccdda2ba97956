//! Canonical data model: transactions, patterns, hypotheses, actions, and
//! the process-wide agent state they act upon.

pub mod action;
pub mod agent_state;
pub mod hypothesis;
pub mod pattern;
pub mod transaction;

pub use action::{
    Action, ActionParameters, ActionStatus, ActionType, AuthorizationLevel, Impact, RiskLevel,
};
pub use agent_state::{AgentState, GateViolation, RetryStrategy, RoutingOverride, SafetyLimits};
pub use hypothesis::{normalize_probabilities, Hypothesis};
pub use pattern::{Dimension, Pattern, PatternType};
pub use transaction::{
    Money, PaymentMethod, Transaction, TransactionBuilder, TransactionError, TransactionStatus,
};
