//! Process-wide mutable control surface and the safety gates guarding it.

use super::action::{Action, ActionType, AuthorizationLevel, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// A merged retry strategy override for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryStrategy {
    pub max_retries: Option<u32>,
    pub backoff_multiplier: Option<f64>,
    pub timeout_ms: Option<u32>,
}

impl RetryStrategy {
    /// Merges non-`None` fields from `update` over `self`, in place —
    /// the "merge provided fields" execution semantics for `adjust_retry`.
    pub fn merge(&mut self, update: RetryStrategy) {
        if update.max_retries.is_some() {
            self.max_retries = update.max_retries;
        }
        if update.backoff_multiplier.is_some() {
            self.backoff_multiplier = update.backoff_multiplier;
        }
        if update.timeout_ms.is_some() {
            self.timeout_ms = update.timeout_ms;
        }
    }
}

/// A routing override applied to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingOverride {
    pub alternative_routing: Option<bool>,
    pub reduce_routing_pct: Option<u32>,
    pub applied_at: DateTime<Utc>,
}

/// Configurable safety thresholds gating `AgentState::can_take_action`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    pub max_actions_per_hour: u32,
    pub max_rollbacks_per_hour: u32,
    pub max_high_risk_rollbacks_per_hour: u32,
    pub min_confidence: f64,
    pub max_concurrent_interventions: u32,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        SafetyLimits {
            max_actions_per_hour: 50,
            max_rollbacks_per_hour: 10,
            max_high_risk_rollbacks_per_hour: 3,
            min_confidence: 0.6,
            max_concurrent_interventions: 5,
        }
    }
}

/// Reason a candidate action was blocked by the safety gate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateViolation {
    #[error("hourly action limit reached")]
    HourlyActionLimitReached,
    #[error("too many rollbacks in the last hour")]
    RollbackRateExceeded,
    #[error("high-risk action blocked due to recent rollbacks")]
    HighRiskRollbackLimitReached,
    #[error("confidence {0:.2} below minimum required")]
    ConfidenceTooLow(f64),
    #[error("too many concurrent active interventions")]
    ConcurrencyLimitReached,
}

/// Process-wide control surface: active breakers, overrides, and the rolling
/// counters the safety gate consults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub is_active: bool,
    pub last_update: DateTime<Utc>,

    pub overall_success_rate: f64,
    pub average_latency_ms: f64,
    pub total_transactions: u64,

    pub active_circuit_breakers: HashSet<String>,
    pub suppressed_methods: HashSet<String>,
    pub retry_strategies: HashMap<String, RetryStrategy>,
    pub routing_overrides: HashMap<String, RoutingOverride>,

    pub actions_taken_last_hour: u32,
    pub rollbacks_last_hour: u32,

    pub actions_executed: u64,
    pub actions_successful: u64,
    pub patterns_detected: u64,
    pub true_positives: u64,
    pub false_positives: u64,

    pub concurrent_interventions: u32,

    pub limits: SafetyLimits,
}

impl Default for AgentState {
    fn default() -> Self {
        AgentState {
            is_active: true,
            last_update: Utc::now(),
            overall_success_rate: 0.95,
            average_latency_ms: 200.0,
            total_transactions: 0,
            active_circuit_breakers: HashSet::new(),
            suppressed_methods: HashSet::new(),
            retry_strategies: HashMap::new(),
            routing_overrides: HashMap::new(),
            actions_taken_last_hour: 0,
            rollbacks_last_hour: 0,
            actions_executed: 0,
            actions_successful: 0,
            patterns_detected: 0,
            true_positives: 0,
            false_positives: 0,
            concurrent_interventions: 0,
            limits: SafetyLimits::default(),
        }
    }
}

impl AgentState {
    pub fn with_limits(limits: SafetyLimits) -> Self {
        AgentState {
            limits,
            ..Default::default()
        }
    }

    /// Checks whether `action` may execute right now; the single gate shared
    /// by the Decision Maker (before scoring wins) and the Executor (before
    /// a state write).
    pub fn can_take_action(&self, action: &Action) -> Result<(), GateViolation> {
        if self.actions_taken_last_hour >= self.limits.max_actions_per_hour {
            return Err(GateViolation::HourlyActionLimitReached);
        }
        if self.rollbacks_last_hour >= self.limits.max_rollbacks_per_hour {
            return Err(GateViolation::RollbackRateExceeded);
        }
        if matches!(action.risk_level, RiskLevel::High | RiskLevel::Critical)
            && self.rollbacks_last_hour >= self.limits.max_high_risk_rollbacks_per_hour
        {
            return Err(GateViolation::HighRiskRollbackLimitReached);
        }
        if action.confidence < self.limits.min_confidence {
            return Err(GateViolation::ConfidenceTooLow(action.confidence));
        }
        if self.concurrent_interventions >= self.limits.max_concurrent_interventions {
            return Err(GateViolation::ConcurrencyLimitReached);
        }
        Ok(())
    }

    /// Base authorization level for an action type, before traffic-impact
    /// escalation.
    pub fn base_authorization(action_type: ActionType) -> AuthorizationLevel {
        match action_type {
            ActionType::AdjustRetry | ActionType::AlertOps | ActionType::NoAction => {
                AuthorizationLevel::Automatic
            }
            ActionType::CircuitBreaker | ActionType::RouteChange => {
                AuthorizationLevel::SemiAutomatic
            }
            ActionType::MethodSuppress => AuthorizationLevel::Manual,
        }
    }

    /// Escalates the base authorization level by how much traffic the action
    /// affects: above 5% automatic becomes semi-automatic, above 20%
    /// anything becomes manual.
    pub fn required_authorization(
        action_type: ActionType,
        affected_traffic_pct: f64,
    ) -> AuthorizationLevel {
        let base = Self::base_authorization(action_type);
        if affected_traffic_pct > 0.20 {
            return AuthorizationLevel::Manual;
        }
        if affected_traffic_pct > 0.05 && base == AuthorizationLevel::Automatic {
            return AuthorizationLevel::SemiAutomatic;
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::action::{ActionParameters, ActionStatus, Impact};

    fn sample_action(risk_level: RiskLevel, confidence: f64) -> Action {
        Action {
            id: "a1".to_string(),
            target: "HDFC".to_string(),
            parameters: ActionParameters::NoAction {},
            risk_level,
            authorization_level: AuthorizationLevel::Automatic,
            estimated_impact: Impact::default(),
            reasoning: String::new(),
            confidence,
            created_at: Utc::now(),
            executed_at: None,
            completed_at: None,
            status: ActionStatus::Pending,
            approver: None,
            actual_impact: None,
        }
    }

    #[test]
    fn blocks_when_hourly_limit_reached() {
        let mut state = AgentState::default();
        state.actions_taken_last_hour = 50;
        let err = state
            .can_take_action(&sample_action(RiskLevel::Low, 0.9))
            .unwrap_err();
        assert_eq!(err, GateViolation::HourlyActionLimitReached);
    }

    #[test]
    fn blocks_high_risk_after_three_rollbacks() {
        let mut state = AgentState::default();
        state.rollbacks_last_hour = 3;
        let err = state
            .can_take_action(&sample_action(RiskLevel::High, 0.9))
            .unwrap_err();
        assert_eq!(err, GateViolation::HighRiskRollbackLimitReached);
    }

    #[test]
    fn escalates_authorization_above_traffic_thresholds() {
        assert_eq!(
            AgentState::required_authorization(ActionType::AdjustRetry, 0.01),
            AuthorizationLevel::Automatic
        );
        assert_eq!(
            AgentState::required_authorization(ActionType::AdjustRetry, 0.10),
            AuthorizationLevel::SemiAutomatic
        );
        assert_eq!(
            AgentState::required_authorization(ActionType::AdjustRetry, 0.25),
            AuthorizationLevel::Manual
        );
    }
}
