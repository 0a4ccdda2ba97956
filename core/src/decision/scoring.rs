//! Per-objective scoring functions and the weighted combination.

use super::{DecisionContext, DecisionWeights};
use crate::model::{Action, RiskLevel};

fn impact_limit(risk_level: RiskLevel) -> f64 {
    match risk_level {
        RiskLevel::Low => 0.05,
        RiskLevel::Medium => 0.10,
        RiskLevel::High => 0.20,
        RiskLevel::Critical => 1.00,
    }
}

fn base_risk_score(risk_level: RiskLevel) -> f64 {
    match risk_level {
        RiskLevel::Low => 1.0,
        RiskLevel::Medium => 0.7,
        RiskLevel::High => 0.4,
        RiskLevel::Critical => 0.1,
    }
}

/// Positive delta is good, scaled by pattern severity; negative delta
/// penalises linearly until -0.10 drives it to 0.
fn score_success_impact(delta: f64, pattern_severity: f64) -> f64 {
    if delta > 0.0 {
        (delta / 0.20 * pattern_severity).min(1.0)
    } else {
        (1.0 + delta / 0.10).max(0.0)
    }
}

/// Negative delta (reduction) is good; positive delta (increase) is bad.
fn score_latency_impact(delta_ms: f64, current_latency: f64) -> f64 {
    let floor = current_latency.max(100.0);
    if delta_ms < 0.0 {
        let reduction_pct = delta_ms.abs() / floor;
        (reduction_pct * 2.0).min(1.0)
    } else {
        let increase_pct = delta_ms / floor;
        (1.0 - increase_pct).max(0.0)
    }
}

fn score_cost_impact(delta_per_txn: f64) -> f64 {
    if delta_per_txn == 0.0 {
        1.0
    } else if delta_per_txn <= 0.02 {
        0.8
    } else if delta_per_txn <= 0.05 {
        0.5
    } else {
        0.2
    }
}

fn score_risk(risk_level: RiskLevel, affected_pct: f64, rollbacks_last_hour: u32) -> f64 {
    let mut score = base_risk_score(risk_level);

    let limit = impact_limit(risk_level);
    if affected_pct > limit {
        let penalty = (affected_pct - limit) / limit;
        score *= (1.0 - penalty).max(0.1);
    }

    if rollbacks_last_hour > 0 {
        score *= 0.8;
    }

    score
}

/// `score = confidence * Σ wᵢ · objectiveᵢ`; returns the score and a
/// human-readable breakdown for the reasoning text.
pub(super) fn evaluate(
    weights: &DecisionWeights,
    action: &Action,
    context: &DecisionContext,
) -> (f64, String) {
    let impact = action.estimated_impact;

    let success_score = score_success_impact(impact.success_rate_delta, context.pattern.severity);
    let latency_score = score_latency_impact(impact.latency_delta_ms, context.state.average_latency_ms);
    let cost_score = score_cost_impact(impact.cost_delta_per_txn);
    let risk_score = score_risk(
        action.risk_level,
        impact.affected_traffic_pct,
        context.state.rollbacks_last_hour,
    );

    let mut total = weights.success_rate * success_score
        + weights.latency * latency_score
        + weights.cost * cost_score
        + weights.risk * risk_score;
    total *= action.confidence;

    let explanation = format!(
        "Success: {:.2}, Latency: {:.2}, Cost: {:.2}, Risk: {:.2}, Total: {:.2}",
        success_score, latency_score, cost_score, risk_score, total
    );

    (total, explanation)
}
