//! Decision Maker
//!
//! Generates candidate actions for a detected pattern, scores each by a
//! weighted multi-objective function, and picks the best feasible candidate
//! under the safety gate.

mod actions;
mod scoring;

use crate::clock::Clock;
use crate::model::{Action, ActionType, AgentState, Hypothesis, Pattern};
use crate::rng::IdGenerator;

/// Tunable objective weights; the Learner mutates these in place every ten
/// cycles via `update_decision_weights` (see [`crate::learner`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionWeights {
    pub success_rate: f64,
    pub latency: f64,
    pub cost: f64,
    pub risk: f64,
}

impl Default for DecisionWeights {
    fn default() -> Self {
        DecisionWeights {
            success_rate: 0.40,
            latency: 0.25,
            cost: 0.20,
            risk: 0.15,
        }
    }
}

impl DecisionWeights {
    pub fn normalize(&mut self) {
        let sum = self.success_rate + self.latency + self.cost + self.risk;
        if sum > 0.0 {
            self.success_rate /= sum;
            self.latency /= sum;
            self.cost /= sum;
            self.risk /= sum;
        }
    }
}

/// Everything the Decision Maker needs to evaluate candidates for one
/// pattern: the pattern itself, its hypotheses, and the current state.
pub struct DecisionContext<'a> {
    pub pattern: &'a Pattern,
    pub hypotheses: &'a [Hypothesis],
    pub state: &'a AgentState,
}

/// A scored candidate, retained for the reasoning text's "alternatives
/// considered" section.
struct Evaluated {
    action: Action,
    score: f64,
    explanation: String,
}

pub struct DecisionMaker {
    pub weights: DecisionWeights,
}

impl Default for DecisionMaker {
    fn default() -> Self {
        DecisionMaker {
            weights: DecisionWeights::default(),
        }
    }
}

impl DecisionMaker {
    pub fn new(weights: DecisionWeights) -> Self {
        DecisionMaker { weights }
    }

    /// Picks the best feasible action for `context`, or `None` with a
    /// reason if no candidate exists or the top candidate is blocked by the
    /// safety gate. Never falls back to a worse candidate when blocked.
    pub fn decide(
        &self,
        context: &DecisionContext,
        clock: &dyn Clock,
        ids: &mut dyn IdGenerator,
    ) -> (Option<Action>, String) {
        let candidates = actions::generate(context.pattern, context.state, clock, ids);
        if candidates.is_empty() {
            return (None, "No viable actions available for this pattern".to_string());
        }

        let mut evaluated: Vec<Evaluated> = candidates
            .into_iter()
            .map(|action| {
                let (score, explanation) = scoring::evaluate(&self.weights, &action, context);
                Evaluated {
                    action,
                    score,
                    explanation,
                }
            })
            .collect();
        evaluated.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

        // A zero-impact candidate scores a perfect 1.0 on every objective
        // (no degradation on any dimension beats no degradation at all),
        // which would otherwise let `no_action`/`alert_ops` outrank every
        // real remediation regardless of how severe the pattern is.
        // Domain-specific candidates compete among themselves first;
        // `no_action`/`alert_ops` only become the pick when a pattern type
        // generates no domain-specific candidate (error clusters).
        let best_index = evaluated
            .iter()
            .position(|e| !matches!(e.action.action_type(), ActionType::NoAction | ActionType::AlertOps))
            .unwrap_or(0);

        let best = &evaluated[best_index];
        if let Err(violation) = context.state.can_take_action(&best.action) {
            return (None, format!("Best action blocked: {}", violation));
        }

        let reasoning = self.build_reasoning(context, &evaluated, best_index);
        let mut action = evaluated.remove(best_index).action;
        action.reasoning = reasoning.clone();
        (Some(action), reasoning)
    }

    fn build_reasoning(&self, context: &DecisionContext, evaluated: &[Evaluated], best_index: usize) -> String {
        let pattern = context.pattern;
        let selected = &evaluated[best_index].action;

        let mut parts = Vec::new();
        parts.push("## Pattern Detected\n".to_string());
        parts.push(format!("Type: {:?}", pattern.pattern_type));
        parts.push(format!("Severity: {:.2}", pattern.severity));
        parts.push(format!("Description: {}", pattern.description));
        parts.push(format!("Confidence: {:.2}\n", pattern.confidence));

        if !context.hypotheses.is_empty() {
            parts.push("## Hypothesized Root Causes\n".to_string());
            let mut sorted: Vec<&Hypothesis> = context.hypotheses.iter().collect();
            sorted.sort_by(|a, b| b.probability.partial_cmp(&a.probability).unwrap());
            for hyp in sorted.into_iter().take(3) {
                parts.push(format!(
                    "- {} (probability: {:.2})",
                    hyp.root_cause, hyp.probability
                ));
            }
            parts.push(String::new());
        }

        parts.push("## Selected Action\n".to_string());
        parts.push(format!("Type: {:?}", selected.action_type()));
        parts.push(format!("Target: {}", selected.target));
        parts.push(format!("Risk Level: {:?}", selected.risk_level));
        parts.push(format!("Authorization: {:?}\n", selected.authorization_level));

        parts.push("## Expected Impact\n".to_string());
        let impact = selected.estimated_impact;
        parts.push(format!("- Success Rate: {:.1}% change", impact.success_rate_delta * 100.0));
        parts.push(format!("- Latency: {:.0}ms change", impact.latency_delta_ms));
        parts.push(format!("- Cost: ${:.3} per transaction", impact.cost_delta_per_txn));
        parts.push(format!("- Affected Traffic: {:.1}%\n", impact.affected_traffic_pct * 100.0));

        parts.push("## Alternatives Considered\n".to_string());
        for candidate in evaluated.iter().take(3) {
            if candidate.action.id == selected.id {
                continue;
            }
            parts.push(format!(
                "- {:?}: score {:.2} ({})",
                candidate.action.action_type(),
                candidate.score,
                candidate.explanation
            ));
        }

        parts.join("\n")
    }
}
