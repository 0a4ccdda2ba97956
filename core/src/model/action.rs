//! Candidate and executed remediation actions.

use super::pattern::PatternType;
use super::transaction::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    AdjustRetry,
    CircuitBreaker,
    RouteChange,
    MethodSuppress,
    AlertOps,
    NoAction,
}

impl ActionType {
    pub fn as_tag(&self) -> &'static str {
        match self {
            ActionType::AdjustRetry => "adjust_retry",
            ActionType::CircuitBreaker => "circuit_breaker",
            ActionType::RouteChange => "route_change",
            ActionType::MethodSuppress => "method_suppress",
            ActionType::AlertOps => "alert_ops",
            ActionType::NoAction => "no_action",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationLevel {
    Automatic,
    SemiAutomatic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Executed,
    Completed,
    RolledBack,
    Failed,
}

/// Parameters for one candidate action, tagged by [`ActionType`].
///
/// One variant per `ActionType`, matching the original's per-action-type
/// parameter dictionaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionParameters {
    CircuitBreaker {
        issuer: String,
        duration_minutes: u32,
        route_to: String,
    },
    RouteChange {
        issuer: Option<String>,
        region: Option<String>,
        reduce_routing_pct: Option<u32>,
        alternative_routing: Option<bool>,
        duration_minutes: u32,
    },
    AdjustRetry {
        max_retries: Option<u32>,
        backoff_multiplier: Option<f64>,
        timeout_ms: Option<u32>,
        payment_method: Option<PaymentMethod>,
        duration_minutes: u32,
    },
    MethodSuppress {
        payment_method: PaymentMethod,
        duration_minutes: u32,
    },
    AlertOps {
        pattern_type: PatternType,
        severity: f64,
        description: String,
    },
    NoAction {},
}

impl ActionParameters {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionParameters::CircuitBreaker { .. } => ActionType::CircuitBreaker,
            ActionParameters::RouteChange { .. } => ActionType::RouteChange,
            ActionParameters::AdjustRetry { .. } => ActionType::AdjustRetry,
            ActionParameters::MethodSuppress { .. } => ActionType::MethodSuppress,
            ActionParameters::AlertOps { .. } => ActionType::AlertOps,
            ActionParameters::NoAction {} => ActionType::NoAction,
        }
    }

    /// The `durationMinutes` a rollback's expiry check is measured against,
    /// if this action type has one.
    pub fn duration_minutes(&self) -> Option<u32> {
        match self {
            ActionParameters::CircuitBreaker {
                duration_minutes, ..
            }
            | ActionParameters::RouteChange {
                duration_minutes, ..
            }
            | ActionParameters::AdjustRetry {
                duration_minutes, ..
            }
            | ActionParameters::MethodSuppress {
                duration_minutes, ..
            } => Some(*duration_minutes),
            ActionParameters::AlertOps { .. } | ActionParameters::NoAction {} => None,
        }
    }
}

/// Projected or observed effect of an action on the four scoring objectives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub success_rate_delta: f64,
    pub latency_delta_ms: f64,
    pub cost_delta_per_txn: f64,
    pub affected_traffic_pct: f64,
}

/// A candidate or in-flight remediation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub target: String,
    pub parameters: ActionParameters,
    pub risk_level: RiskLevel,
    pub authorization_level: AuthorizationLevel,
    pub estimated_impact: Impact,
    pub reasoning: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ActionStatus,
    pub approver: Option<String>,
    pub actual_impact: Option<Impact>,
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        self.parameters.action_type()
    }
}
