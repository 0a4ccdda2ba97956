//! Executor
//!
//! Turns a selected [`Action`] into a mutation of [`AgentState`], subject to
//! the same safety gate the Decision Maker already checked, plus a
//! duplicate-intervention check the Decision Maker cannot see (it only
//! knows about the one pattern it is deciding for). Every other action type
//! is idempotent: executing `circuit_breaker` for an issuer already in
//! `active_circuit_breakers` is a no-op rather than a double-count.
//!
//! `monitor_and_rollback` then watches currently active interventions each
//! cycle and reverses the ones whose observed effect has gone bad, or whose
//! `duration_minutes` has lapsed.

mod notify;

pub use notify::{Alert, NoopSink, NotificationSink, TracingSink};

use crate::clock::Clock;
use crate::errors::CoreError;
use crate::model::{
    Action, ActionParameters, ActionStatus, ActionType, AgentState, Dimension, RetryStrategy,
    RoutingOverride,
};
use crate::observer::Observer;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Conditions under which `monitor_and_rollback` reverses an active
/// intervention. `cost_increase`/`error_rate_increase` are carried for
/// parity with the original's dict but have no corresponding field on
/// [`BaselineMetrics`] in this implementation — there is no cost-per-txn or
/// error-rate sample on the Observer summary to compare against, so those
/// two checks are permanently inert rather than guessing at a source for
/// that data. Absent data skips a check without error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollbackThresholds {
    pub success_rate_drop: f64,
    pub latency_increase: f64,
    pub error_rate_increase: f64,
    pub cost_increase: f64,
}

impl Default for RollbackThresholds {
    fn default() -> Self {
        RollbackThresholds {
            success_rate_drop: 0.05,
            latency_increase: 0.50,
            error_rate_increase: 0.10,
            cost_increase: 0.20,
        }
    }
}

/// A snapshot of overall health, captured both before an action executes
/// and on every `monitor_and_rollback` pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineMetrics {
    pub success_rate: f64,
    pub avg_latency: f64,
    pub transaction_volume: u64,
    pub timestamp: DateTime<Utc>,
}

fn capture_baseline_metrics(observer: &Observer, clock: &dyn Clock) -> BaselineMetrics {
    BaselineMetrics {
        success_rate: observer.success_rate(Dimension::Overall, ""),
        avg_latency: observer.latency_stats(Dimension::Overall, "").mean,
        transaction_volume: observer.transaction_volume(Dimension::Overall, ""),
        timestamp: clock.now(),
    }
}

/// One entry in the bounded execution history.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionLogEntry {
    pub action_id: String,
    pub action_type: ActionType,
    pub target: String,
    pub executed_at: DateTime<Utc>,
    pub success: bool,
    pub message: String,
    pub baseline_metrics: BaselineMetrics,
    pub parameters: ActionParameters,
}

const EXECUTION_LOG_CAPACITY: usize = 1000;

/// Executes selected actions against [`AgentState`] and watches them for
/// rollback.
pub struct Executor<S: NotificationSink> {
    pub rollback_thresholds: RollbackThresholds,
    sink: S,
    execution_log: VecDeque<ExecutionLogEntry>,
    active_interventions: Vec<Action>,
}

impl Executor<TracingSink> {
    pub fn new() -> Self {
        Executor::with_sink(TracingSink)
    }
}

impl Default for Executor<TracingSink> {
    fn default() -> Self {
        Executor::new()
    }
}

impl<S: NotificationSink> Executor<S> {
    pub fn with_sink(sink: S) -> Self {
        Executor {
            rollback_thresholds: RollbackThresholds::default(),
            sink,
            execution_log: VecDeque::new(),
            active_interventions: Vec::new(),
        }
    }

    fn pre_execution_checks(&self, action: &Action, state: &AgentState) -> Result<(), CoreError> {
        // Low-risk actions are the orchestrator's auto_approve_low_risk lane: it
        // never stamps an approver for them regardless of how far traffic share
        // escalates their authorization_level, so the gate here has to leave
        // them be too rather than reject what the orchestrator already decided
        // not to hold up for a human.
        if action.authorization_level == crate::model::AuthorizationLevel::Manual
            && action.risk_level != crate::model::RiskLevel::Low
            && action.approver.is_none()
        {
            return Err(CoreError::StateConflict(
                "manual authorization requires an approver".to_string(),
            ));
        }
        if action.authorization_level == crate::model::AuthorizationLevel::SemiAutomatic
            && action.risk_level != crate::model::RiskLevel::Low
            && action.approver.is_none()
        {
            return Err(CoreError::StateConflict(
                "semi-automatic, non-low-risk action requires an approver".to_string(),
            ));
        }
        state
            .can_take_action(action)
            .map_err(|violation| CoreError::StateConflict(violation.to_string()))?;

        let duplicate = self
            .active_interventions
            .iter()
            .any(|a| a.action_type() == action.action_type() && a.target == action.target);
        if duplicate {
            return Err(CoreError::StateConflict(format!(
                "an intervention of type {:?} is already active for {}",
                action.action_type(),
                action.target
            )));
        }

        Ok(())
    }

    /// Applies `action`'s effect to `state`. All action types but
    /// `circuit_breaker` overwrite their target's entry; `circuit_breaker`
    /// inserts into a set, which is idempotent by construction.
    fn execute_by_type(&self, action: &Action, state: &mut AgentState) -> Result<String, CoreError> {
        match &action.parameters {
            ActionParameters::CircuitBreaker { issuer, .. } => {
                state.active_circuit_breakers.insert(issuer.clone());
                Ok(format!("Circuit breaker activated for {}", issuer))
            }
            ActionParameters::AdjustRetry {
                max_retries,
                backoff_multiplier,
                timeout_ms,
                ..
            } => {
                state
                    .retry_strategies
                    .entry(action.target.clone())
                    .or_default()
                    .merge(RetryStrategy {
                        max_retries: *max_retries,
                        backoff_multiplier: *backoff_multiplier,
                        timeout_ms: *timeout_ms,
                    });
                Ok(format!("Retry strategy adjusted for {}", action.target))
            }
            ActionParameters::RouteChange {
                reduce_routing_pct,
                alternative_routing,
                ..
            } => {
                state.routing_overrides.insert(
                    action.target.clone(),
                    RoutingOverride {
                        alternative_routing: *alternative_routing,
                        reduce_routing_pct: *reduce_routing_pct,
                        applied_at: action.created_at,
                    },
                );
                Ok(format!("Routing changed for {}", action.target))
            }
            ActionParameters::MethodSuppress { payment_method, .. } => {
                state
                    .suppressed_methods
                    .insert(payment_method.as_tag().to_string());
                Ok(format!("Payment method {} temporarily suppressed", payment_method.as_tag()))
            }
            ActionParameters::AlertOps {
                pattern_type,
                severity,
                description,
            } => {
                self.sink.notify(&Alert {
                    pattern_type: *pattern_type,
                    severity: *severity,
                    description: description.clone(),
                    created_at: action.created_at,
                });
                Ok("Alert sent to ops team".to_string())
            }
            ActionParameters::NoAction {} => Ok("No action taken".to_string()),
        }
    }

    fn log_execution(&mut self, action: &Action, baseline: BaselineMetrics, success: bool, message: String) {
        if self.execution_log.len() >= EXECUTION_LOG_CAPACITY {
            self.execution_log.pop_front();
        }
        self.execution_log.push_back(ExecutionLogEntry {
            action_id: action.id.clone(),
            action_type: action.action_type(),
            target: action.target.clone(),
            executed_at: action.created_at,
            success,
            message,
            baseline_metrics: baseline,
            parameters: action.parameters.clone(),
        });
    }

    /// Runs the pre-execution checks, applies the action, and records it.
    /// On success the returned `Action` carries `status: Executed` and is
    /// tracked as an active intervention; on failure `status: Failed` and
    /// the error both come back, with no state mutation.
    pub fn execute(
        &mut self,
        mut action: Action,
        state: &mut AgentState,
        observer: &Observer,
        clock: &dyn Clock,
    ) -> Result<Action, CoreError> {
        self.pre_execution_checks(&action, state)?;

        let baseline = capture_baseline_metrics(observer, clock);

        match self.execute_by_type(&action, state) {
            Ok(message) => {
                action.status = ActionStatus::Executed;
                action.executed_at = Some(clock.now());
                self.active_interventions.push(action.clone());
                state.actions_taken_last_hour += 1;
                state.actions_executed += 1;
                state.actions_successful += 1;
                state.concurrent_interventions += 1;
                self.log_execution(&action, baseline, true, message);
                Ok(action)
            }
            Err(err) => {
                action.status = ActionStatus::Failed;
                self.log_execution(&action, baseline, false, err.to_string());
                Err(err)
            }
        }
    }

    fn find_baseline_for_action(&self, action_id: &str) -> Option<BaselineMetrics> {
        self.execution_log
            .iter()
            .rev()
            .find(|entry| entry.action_id == action_id)
            .map(|entry| entry.baseline_metrics)
    }

    fn should_rollback(&self, action: &Action, baseline: BaselineMetrics, current: BaselineMetrics, clock: &dyn Clock) -> Option<String> {
        let success_drop = baseline.success_rate - current.success_rate;
        if success_drop > self.rollback_thresholds.success_rate_drop {
            return Some(format!("Success rate dropped {:.1}%", success_drop * 100.0));
        }

        if baseline.avg_latency > 0.0 {
            let latency_increase = (current.avg_latency - baseline.avg_latency) / baseline.avg_latency;
            if latency_increase > self.rollback_thresholds.latency_increase {
                return Some(format!("Latency increased {:.1}%", latency_increase * 100.0));
            }
        }

        if let Some(executed_at) = action.executed_at {
            let duration = clock.now() - executed_at;
            let max_duration = Duration::minutes(action.parameters.duration_minutes().unwrap_or(30) as i64);
            if duration > max_duration {
                return Some("Action duration expired".to_string());
            }
        }

        None
    }

    fn rollback_action(
        &mut self,
        action_id: &str,
        reason: &str,
        baseline: BaselineMetrics,
        state: &mut AgentState,
        clock: &dyn Clock,
    ) -> bool {
        let Some(pos) = self.active_interventions.iter().position(|a| a.id == action_id) else {
            return false;
        };
        let mut action = self.active_interventions.remove(pos);

        match &action.parameters {
            ActionParameters::CircuitBreaker { issuer, .. } => {
                state.active_circuit_breakers.remove(issuer);
            }
            ActionParameters::AdjustRetry { .. } => {
                state.retry_strategies.remove(&action.target);
            }
            ActionParameters::RouteChange { .. } => {
                state.routing_overrides.remove(&action.target);
            }
            ActionParameters::MethodSuppress { payment_method, .. } => {
                state.suppressed_methods.remove(payment_method.as_tag());
            }
            ActionParameters::AlertOps { .. } | ActionParameters::NoAction {} => {}
        }

        action.status = ActionStatus::RolledBack;
        action.completed_at = Some(clock.now());
        state.concurrent_interventions = state.concurrent_interventions.saturating_sub(1);
        self.log_execution(&action, baseline, true, reason.to_string());
        true
    }

    /// Checks every active intervention against its captured baseline and
    /// rolls back the ones that have gone bad or expired. Returns one
    /// `"{action_id}: {reason}"` entry per rollback this pass.
    pub fn monitor_and_rollback(&mut self, state: &mut AgentState, observer: &Observer, clock: &dyn Clock) -> Vec<String> {
        let current = capture_baseline_metrics(observer, clock);
        let mut rolled_back = Vec::new();

        for action in self.active_interventions.clone() {
            let Some(baseline) = self.find_baseline_for_action(&action.id) else {
                continue;
            };
            if let Some(reason) = self.should_rollback(&action, baseline, current, clock) {
                if self.rollback_action(&action.id, &reason, baseline, state, clock) {
                    tracing::warn!(action_id = %action.id, target = %action.target, reason = %reason, "rolled back intervention");
                    rolled_back.push(format!("{}: {}", action.id, reason));
                    state.rollbacks_last_hour += 1;
                }
            }
        }

        rolled_back
    }

    pub fn active_interventions(&self) -> &[Action] {
        &self.active_interventions
    }

    pub fn execution_history(&self, limit: usize) -> Vec<&ExecutionLogEntry> {
        self.execution_log.iter().rev().take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::{ActionStatus, AuthorizationLevel, Impact, RiskLevel};
    use crate::rng::{DeterministicIdGenerator, IdGenerator};
    use chrono::Duration as ChronoDuration;

    fn sample_action(ids: &mut dyn IdGenerator, clock: &FixedClock, target: &str) -> Action {
        Action {
            id: ids.next_id(),
            target: target.to_string(),
            parameters: ActionParameters::CircuitBreaker {
                issuer: target.to_string(),
                duration_minutes: 10,
                route_to: "alternative_issuers".to_string(),
            },
            risk_level: RiskLevel::Medium,
            authorization_level: AuthorizationLevel::Automatic,
            estimated_impact: Impact::default(),
            reasoning: String::new(),
            confidence: 0.9,
            created_at: clock.now(),
            executed_at: None,
            completed_at: None,
            status: ActionStatus::Pending,
            approver: None,
            actual_impact: None,
        }
    }

    #[test]
    fn execute_adds_to_active_circuit_breakers() {
        let clock = FixedClock::at_epoch();
        let mut ids = DeterministicIdGenerator::new(1);
        let mut state = AgentState::default();
        let observer = Observer::new(ChronoDuration::minutes(10));
        let mut executor = Executor::with_sink(NoopSink);

        let action = sample_action(&mut ids, &clock, "HDFC");
        let executed = executor.execute(action, &mut state, &observer, &clock).unwrap();

        assert_eq!(executed.status, ActionStatus::Executed);
        assert!(state.active_circuit_breakers.contains("HDFC"));
        assert_eq!(executor.active_interventions().len(), 1);
    }

    #[test]
    fn duplicate_active_intervention_is_rejected() {
        let clock = FixedClock::at_epoch();
        let mut ids = DeterministicIdGenerator::new(1);
        let mut state = AgentState::default();
        let observer = Observer::new(ChronoDuration::minutes(10));
        let mut executor = Executor::with_sink(NoopSink);

        let first = sample_action(&mut ids, &clock, "HDFC");
        executor.execute(first, &mut state, &observer, &clock).unwrap();

        let second = sample_action(&mut ids, &clock, "HDFC");
        let err = executor.execute(second, &mut state, &observer, &clock).unwrap_err();
        assert!(matches!(err, CoreError::StateConflict(_)));
    }

    #[test]
    fn manual_action_without_approver_is_blocked() {
        let clock = FixedClock::at_epoch();
        let mut ids = DeterministicIdGenerator::new(1);
        let mut state = AgentState::default();
        let observer = Observer::new(ChronoDuration::minutes(10));
        let mut executor = Executor::with_sink(NoopSink);

        let mut action = sample_action(&mut ids, &clock, "HDFC");
        action.authorization_level = AuthorizationLevel::Manual;
        let err = executor.execute(action, &mut state, &observer, &clock).unwrap_err();
        assert!(matches!(err, CoreError::StateConflict(_)));
    }

    #[test]
    fn rollback_reverses_circuit_breaker_and_frees_concurrency_slot() {
        let mut clock = FixedClock::at_epoch();
        let mut ids = DeterministicIdGenerator::new(1);
        let mut state = AgentState::default();
        let observer = Observer::new(ChronoDuration::minutes(10));
        let mut executor = Executor::with_sink(NoopSink);

        let action = sample_action(&mut ids, &clock, "HDFC");
        executor.execute(action, &mut state, &observer, &clock).unwrap();
        assert_eq!(state.concurrent_interventions, 1);

        clock.advance(ChronoDuration::minutes(11));
        let rolled_back = executor.monitor_and_rollback(&mut state, &observer, &clock);

        assert_eq!(rolled_back.len(), 1);
        assert!(!state.active_circuit_breakers.contains("HDFC"));
        assert_eq!(state.concurrent_interventions, 0);
        assert_eq!(state.rollbacks_last_hour, 1);
        assert!(executor.active_interventions().is_empty());
    }
}
