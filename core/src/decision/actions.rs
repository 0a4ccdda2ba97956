//! Per-pattern-type candidate action generation. One function per
//! `PatternType`, always closed out with a `no_action` and an `alert_ops`
//! candidate — mirroring the original's `_generate_actions` dispatch.

use crate::clock::Clock;
use crate::model::{
    Action, ActionParameters, ActionStatus, AgentState, Impact, Pattern, PatternType,
    PaymentMethod, RiskLevel,
};
use crate::rng::IdGenerator;

fn traffic_share(pattern: &Pattern, state: &AgentState, factor: f64) -> f64 {
    let volume = pattern.metrics.get("volume").copied().unwrap_or(0.0);
    let total = (state.total_transactions as f64).max(1.0);
    (volume / total) * factor
}

/// Authorization is never hardcoded per call site: it's always the
/// type's base level escalated by how much traffic the candidate
/// affects, so a `circuit_breaker`/`route_change` gets `semi_automatic`
/// and anything touching a wide enough slice of traffic gets escalated
/// further, matching `AgentState::required_authorization`.
fn base_action(
    ids: &mut dyn IdGenerator,
    clock: &dyn Clock,
    target: impl Into<String>,
    parameters: ActionParameters,
    risk_level: RiskLevel,
    estimated_impact: Impact,
    confidence: f64,
) -> Action {
    let authorization_level =
        AgentState::required_authorization(parameters.action_type(), estimated_impact.affected_traffic_pct);
    Action {
        id: ids.next_id(),
        target: target.into(),
        parameters,
        risk_level,
        authorization_level,
        estimated_impact,
        reasoning: String::new(),
        confidence,
        created_at: clock.now(),
        executed_at: None,
        completed_at: None,
        status: ActionStatus::Pending,
        approver: None,
        actual_impact: None,
    }
}

fn no_action(_pattern: &Pattern, ids: &mut dyn IdGenerator, clock: &dyn Clock) -> Action {
    base_action(
        ids,
        clock,
        "none",
        ActionParameters::NoAction {},
        RiskLevel::Low,
        Impact::default(),
        1.0,
    )
    .with_reasoning("Monitor situation without intervention")
}

trait WithReasoning {
    fn with_reasoning(self, reasoning: &str) -> Self;
}
impl WithReasoning for Action {
    fn with_reasoning(mut self, reasoning: &str) -> Self {
        self.reasoning = reasoning.to_string();
        self
    }
}

fn alert_ops(pattern: &Pattern, ids: &mut dyn IdGenerator, clock: &dyn Clock) -> Action {
    base_action(
        ids,
        clock,
        "ops_team",
        ActionParameters::AlertOps {
            pattern_type: pattern.pattern_type,
            severity: pattern.severity,
            description: pattern.description.clone(),
        },
        RiskLevel::Low,
        Impact::default(),
        1.0,
    )
}

fn issuer_actions(
    pattern: &Pattern,
    state: &AgentState,
    ids: &mut dyn IdGenerator,
    clock: &dyn Clock,
) -> Vec<Action> {
    let issuer = pattern.affected_value.clone();
    let mut actions = Vec::new();

    if !state.active_circuit_breakers.contains(&issuer) {
        actions.push(base_action(
            ids,
            clock,
            issuer.clone(),
            ActionParameters::CircuitBreaker {
                issuer: issuer.clone(),
                duration_minutes: 10,
                route_to: "alternative_issuers".to_string(),
            },
            RiskLevel::Medium,
            Impact {
                success_rate_delta: 0.15,
                latency_delta_ms: -200.0,
                cost_delta_per_txn: 0.02,
                affected_traffic_pct: traffic_share(pattern, state, 1.0),
            },
            pattern.confidence,
        ));
    }

    actions.push(base_action(
        ids,
        clock,
        issuer.clone(),
        ActionParameters::RouteChange {
            issuer: Some(issuer.clone()),
            region: None,
            reduce_routing_pct: Some(50),
            alternative_routing: None,
            duration_minutes: 15,
        },
        RiskLevel::Low,
        Impact {
            success_rate_delta: 0.08,
            latency_delta_ms: 20.0,
            cost_delta_per_txn: 0.01,
            affected_traffic_pct: traffic_share(pattern, state, 0.5),
        },
        pattern.confidence * 0.9,
    ));

    actions
}

fn retry_actions(pattern: &Pattern, ids: &mut dyn IdGenerator, clock: &dyn Clock) -> Vec<Action> {
    let retry_percentage = pattern.metrics.get("retry_percentage").copied().unwrap_or(0.0);

    vec![base_action(
        ids,
        clock,
        "global_retry_strategy",
        ActionParameters::AdjustRetry {
            max_retries: Some(2),
            backoff_multiplier: Some(2.0),
            timeout_ms: None,
            payment_method: None,
            duration_minutes: 15,
        },
        RiskLevel::Low,
        Impact {
            success_rate_delta: -0.02,
            latency_delta_ms: -100.0,
            cost_delta_per_txn: -0.005,
            affected_traffic_pct: retry_percentage,
        },
        pattern.confidence,
    )]
}

fn method_actions(
    pattern: &Pattern,
    state: &AgentState,
    ids: &mut dyn IdGenerator,
    clock: &dyn Clock,
) -> Vec<Action> {
    let method_tag = pattern.affected_value.clone();
    let method = parse_method(&method_tag);

    vec![base_action(
        ids,
        clock,
        format!("method_{}", method_tag),
        ActionParameters::AdjustRetry {
            max_retries: Some(1),
            backoff_multiplier: None,
            timeout_ms: None,
            payment_method: method,
            duration_minutes: 20,
        },
        RiskLevel::Low,
        Impact {
            success_rate_delta: 0.05,
            latency_delta_ms: -150.0,
            cost_delta_per_txn: 0.0,
            affected_traffic_pct: traffic_share(pattern, state, 1.0),
        },
        pattern.confidence,
    )]
}

fn latency_actions(pattern: &Pattern, ids: &mut dyn IdGenerator, clock: &dyn Clock) -> Vec<Action> {
    vec![base_action(
        ids,
        clock,
        "timeout_settings",
        ActionParameters::AdjustRetry {
            max_retries: None,
            backoff_multiplier: None,
            timeout_ms: Some(3000),
            payment_method: None,
            duration_minutes: 10,
        },
        RiskLevel::Low,
        Impact {
            success_rate_delta: -0.03,
            latency_delta_ms: -500.0,
            cost_delta_per_txn: 0.0,
            affected_traffic_pct: 1.0,
        },
        pattern.confidence * 0.8,
    )]
}

fn geographic_actions(pattern: &Pattern, state: &AgentState, ids: &mut dyn IdGenerator, clock: &dyn Clock) -> Vec<Action> {
    let region = pattern.affected_value.clone();
    vec![base_action(
        ids,
        clock,
        format!("region_{}", region),
        ActionParameters::RouteChange {
            issuer: None,
            region: Some(region),
            reduce_routing_pct: None,
            alternative_routing: Some(true),
            duration_minutes: 20,
        },
        RiskLevel::Medium,
        Impact {
            success_rate_delta: 0.20,
            latency_delta_ms: 100.0,
            cost_delta_per_txn: 0.03,
            affected_traffic_pct: traffic_share(pattern, state, 1.0),
        },
        pattern.confidence,
    )]
}

fn parse_method(tag: &str) -> Option<PaymentMethod> {
    match tag {
        "credit_card" => Some(PaymentMethod::CreditCard),
        "debit_card" => Some(PaymentMethod::DebitCard),
        "upi" => Some(PaymentMethod::Upi),
        "net_banking" => Some(PaymentMethod::NetBanking),
        "wallet" => Some(PaymentMethod::Wallet),
        _ => None,
    }
}

/// Generates the full candidate set for `pattern`: pattern-type-specific
/// actions plus the always-present `no_action` and `alert_ops`.
/// `error_cluster` contributes no domain-specific candidates, same as the
/// original — a cluster of identical errors is primarily an ops signal.
pub(super) fn generate(
    pattern: &Pattern,
    state: &AgentState,
    clock: &dyn Clock,
    ids: &mut dyn IdGenerator,
) -> Vec<Action> {
    let mut actions = match pattern.pattern_type {
        PatternType::IssuerDegradation => issuer_actions(pattern, state, ids, clock),
        PatternType::RetryStorm => retry_actions(pattern, ids, clock),
        PatternType::MethodFatigue => method_actions(pattern, state, ids, clock),
        PatternType::LatencySpike => latency_actions(pattern, ids, clock),
        PatternType::ErrorCluster => Vec::new(),
        PatternType::GeographicIssue => geographic_actions(pattern, state, ids, clock),
    };

    actions.push(no_action(pattern, ids, clock));
    actions.push(alert_ops(pattern, ids, clock));
    actions
}
