//! Learner
//!
//! Records what actually happened after an action executed, against what
//! the Decision Maker estimated, and uses the accumulated history to
//! recommend threshold adjustments for the Reasoner and to nudge the
//! Decision Maker's objective weights.
//!
//! `evaluate_pattern_detection` is exposed but never called by the core
//! itself — true/false-positive ground truth for a detected pattern isn't
//! something the core can observe on its own; it comes from a caller (an
//! operator reviewing a cycle report, or a later-arriving signal). Until a
//! caller supplies it, `pattern_accuracy` legitimately stays empty.

use crate::decision::DecisionWeights;
use crate::executor::BaselineMetrics;
use crate::model::{Action, ActionType, Impact, PatternType};
use crate::reasoner::Thresholds;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

fn action_key_tag(action_type: ActionType, target: &str) -> String {
    format!("{}_{}", action_type.as_tag(), target)
}

/// The delta actually observed after an action executed, mirroring
/// [`Impact`]'s two metrics the Learner can compare against a baseline
/// (cost and traffic share aren't re-measured post-hoc).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActualImpact {
    pub success_rate_delta: f64,
    pub latency_delta_ms: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
struct Outcome {
    action_id: String,
    action_type: ActionType,
    target: String,
    estimated_impact: Impact,
    actual_impact: ActualImpact,
    prediction_error: f64,
}

/// Effectiveness statistics for one action type (optionally scoped to a
/// target), as returned by [`Learner::effectiveness_for`] /
/// [`Learner::effectiveness_for_type`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionEffectiveness {
    pub sample_size: usize,
    pub avg_success_improvement: f64,
    pub avg_latency_improvement: f64,
    pub prediction_accuracy: f64,
    pub success_rate: f64,
}

impl Default for ActionEffectiveness {
    fn default() -> Self {
        ActionEffectiveness {
            sample_size: 0,
            avg_success_improvement: 0.0,
            avg_latency_improvement: 0.0,
            prediction_accuracy: 0.0,
            success_rate: 0.0,
        }
    }
}

fn summarize(outcomes: &[&Outcome]) -> ActionEffectiveness {
    if outcomes.is_empty() {
        return ActionEffectiveness::default();
    }
    let n = outcomes.len() as f64;
    let avg_success_improvement =
        outcomes.iter().map(|o| o.actual_impact.success_rate_delta).sum::<f64>() / n;
    // Latency improvement is the negated delta: a latency reduction (delta < 0) is good.
    let avg_latency_improvement =
        outcomes.iter().map(|o| -o.actual_impact.latency_delta_ms).sum::<f64>() / n;
    let avg_prediction_error = outcomes.iter().map(|o| o.prediction_error).sum::<f64>() / n;
    let successes = outcomes.iter().filter(|o| o.actual_impact.success_rate_delta > 0.0).count();

    ActionEffectiveness {
        sample_size: outcomes.len(),
        avg_success_improvement,
        avg_latency_improvement,
        prediction_accuracy: 1.0 - avg_prediction_error,
        success_rate: successes as f64 / n,
    }
}

/// True/false-positive counts for one pattern type. `true_negatives` is
/// carried for parity with the original's record shape but nothing in this
/// implementation (or the original) ever increments it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternAccuracyStats {
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
}

impl PatternAccuracyStats {
    pub fn precision(&self) -> f64 {
        let total = self.true_positives + self.false_positives;
        if total == 0 {
            1.0
        } else {
            self.true_positives as f64 / total as f64
        }
    }

    pub fn total_detections(&self) -> u64 {
        self.true_positives + self.false_positives
    }
}

/// One entry of [`LearningSummary::top_actions`].
#[derive(Debug, Clone, PartialEq)]
pub struct TopAction {
    pub action_key: String,
    pub score: f64,
    pub effectiveness: ActionEffectiveness,
}

/// A point-in-time rollup of everything the Learner has accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningSummary {
    pub total_outcomes_recorded: usize,
    pub action_effectiveness: HashMap<String, ActionEffectiveness>,
    pub pattern_accuracy: HashMap<PatternType, PatternAccuracyStats>,
    pub top_actions: Vec<TopAction>,
}

const MIN_SAMPLES_FOR_SUMMARY: usize = 3;

/// Accumulates action outcomes and pattern-detection ground truth, and
/// turns both into recommendations for the Reasoner and Decision Maker.
#[derive(Default)]
pub struct Learner {
    outcomes: HashMap<(ActionType, String), Vec<Outcome>>,
    pattern_accuracy: HashMap<PatternType, PatternAccuracyStats>,
}

impl Learner {
    pub fn new() -> Self {
        Learner::default()
    }

    fn prediction_error(estimated: &Impact, actual: &ActualImpact) -> f64 {
        let mut errors = Vec::new();
        if estimated.success_rate_delta.abs() > 0.001 {
            errors.push(
                ((estimated.success_rate_delta - actual.success_rate_delta) / estimated.success_rate_delta)
                    .abs(),
            );
        }
        if estimated.latency_delta_ms.abs() > 0.001 {
            errors.push(
                ((estimated.latency_delta_ms - actual.latency_delta_ms) / estimated.latency_delta_ms).abs(),
            );
        }
        if errors.is_empty() {
            0.0
        } else {
            errors.iter().sum::<f64>() / errors.len() as f64
        }
    }

    /// Records what happened after `action` executed: `baseline` is the
    /// snapshot captured just before execution, `actual` the snapshot
    /// captured when the outcome is being evaluated. Sets `action`'s
    /// `actual_impact` in place.
    pub fn record_outcome(&mut self, action: &mut Action, baseline: BaselineMetrics, actual: BaselineMetrics, clock: &dyn crate::clock::Clock) {
        let actual_impact = ActualImpact {
            success_rate_delta: actual.success_rate - baseline.success_rate,
            latency_delta_ms: actual.avg_latency - baseline.avg_latency,
            recorded_at: clock.now(),
        };
        let prediction_error = Self::prediction_error(&action.estimated_impact, &actual_impact);

        action.actual_impact = Some(Impact {
            success_rate_delta: actual_impact.success_rate_delta,
            latency_delta_ms: actual_impact.latency_delta_ms,
            cost_delta_per_txn: 0.0,
            affected_traffic_pct: 0.0,
        });

        self.outcomes
            .entry((action.action_type(), action.target.clone()))
            .or_default()
            .push(Outcome {
                action_id: action.id.clone(),
                action_type: action.action_type(),
                target: action.target.clone(),
                estimated_impact: action.estimated_impact,
                actual_impact,
                prediction_error,
            });
    }

    /// Marks a previously detected pattern as a true or false positive.
    /// Never called internally — ground truth comes from outside the core.
    pub fn evaluate_pattern_detection(&mut self, pattern_type: PatternType, was_valid: bool) {
        let stats = self.pattern_accuracy.entry(pattern_type).or_default();
        if was_valid {
            stats.true_positives += 1;
        } else {
            stats.false_positives += 1;
        }
    }

    /// Effectiveness for one `(action_type, target)` pair.
    pub fn effectiveness_for(&self, action_type: ActionType, target: &str) -> ActionEffectiveness {
        match self.outcomes.get(&(action_type, target.to_string())) {
            Some(outcomes) => summarize(&outcomes.iter().collect::<Vec<_>>()),
            None => ActionEffectiveness::default(),
        }
    }

    /// Effectiveness aggregated across every target this action type has
    /// been executed against.
    pub fn effectiveness_for_type(&self, action_type: ActionType) -> ActionEffectiveness {
        let matching: Vec<&Outcome> = self
            .outcomes
            .iter()
            .filter(|((at, _), _)| *at == action_type)
            .flat_map(|(_, outcomes)| outcomes.iter())
            .collect();
        summarize(&matching)
    }

    pub fn pattern_accuracy(&self, pattern_type: PatternType) -> PatternAccuracyStats {
        self.pattern_accuracy.get(&pattern_type).copied().unwrap_or_default()
    }

    /// Recommends a new threshold for every pattern type whose precision has
    /// drifted: below 0.70 the threshold is raised 20% (fewer, more
    /// confident detections); above 0.95 with more than 10 true positives
    /// it's lowered 10% (catch more of a pattern that rarely false-alarms).
    pub fn recommend_threshold_adjustments(&self, thresholds: &Thresholds) -> Vec<(PatternType, f64)> {
        let mut recommendations = Vec::new();
        for (&pattern_type, stats) in &self.pattern_accuracy {
            let precision = stats.precision();
            let current = thresholds.get(pattern_type);

            if precision < 0.70 {
                recommendations.push((pattern_type, current * 1.2));
            } else if precision > 0.95 && stats.true_positives > 10 {
                recommendations.push((pattern_type, current * 0.9));
            }
        }
        recommendations
    }

    /// Nudges `weights` toward the objectives that correlated with a
    /// successful outcome (`success_rate_delta > 0`) across recorded
    /// history, clamps each to `[0.05, 0.60]`, and renormalizes to sum to
    /// 1.0. `risk` is never touched: nothing in the recorded outcomes
    /// carries a signal for it, matching the original's objective-scores
    /// table that declares a `risk` bucket but never appends to it.
    pub fn update_decision_weights(&self, weights: &mut DecisionWeights, learning_rate: f64) {
        let mut success_rate_scores = Vec::new();
        let mut latency_scores = Vec::new();
        let mut cost_scores = Vec::new();

        for outcomes in self.outcomes.values() {
            for outcome in outcomes {
                if outcome.actual_impact.success_rate_delta <= 0.0 {
                    continue;
                }
                let estimated = &outcome.estimated_impact;
                if estimated.success_rate_delta > 0.0 {
                    success_rate_scores.push(1.0);
                }
                if estimated.latency_delta_ms < 0.0 {
                    latency_scores.push(1.0);
                }
                if estimated.cost_delta_per_txn <= 0.02 {
                    cost_scores.push(1.0);
                }
            }
        }

        let adjust = |scores: &[f64], current: f64| -> f64 {
            if scores.is_empty() {
                return current;
            }
            let avg = scores.iter().sum::<f64>() / scores.len() as f64;
            (current + learning_rate * (avg - 0.5)).clamp(0.05, 0.60)
        };

        weights.success_rate = adjust(&success_rate_scores, weights.success_rate);
        weights.latency = adjust(&latency_scores, weights.latency);
        weights.cost = adjust(&cost_scores, weights.cost);
        weights.normalize();
    }

    pub fn summary(&self) -> LearningSummary {
        let total_outcomes_recorded = self.outcomes.values().map(Vec::len).sum();

        let mut action_effectiveness = HashMap::new();
        let mut scored: Vec<TopAction> = Vec::new();

        for ((action_type, target), outcomes) in &self.outcomes {
            if outcomes.len() < MIN_SAMPLES_FOR_SUMMARY {
                continue;
            }
            let effectiveness = summarize(&outcomes.iter().collect::<Vec<_>>());
            let key = action_key_tag(*action_type, target);
            let score = effectiveness.avg_success_improvement * 0.6 + effectiveness.prediction_accuracy * 0.4;
            scored.push(TopAction {
                action_key: key.clone(),
                score,
                effectiveness,
            });
            action_effectiveness.insert(key, effectiveness);
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        scored.truncate(5);

        LearningSummary {
            total_outcomes_recorded,
            action_effectiveness,
            pattern_accuracy: self.pattern_accuracy.clone(),
            top_actions: scored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::{ActionStatus, AuthorizationLevel, RiskLevel};

    fn sample_action(estimated_success_delta: f64) -> Action {
        Action {
            id: "a1".to_string(),
            target: "HDFC".to_string(),
            parameters: crate::model::ActionParameters::NoAction {},
            risk_level: RiskLevel::Low,
            authorization_level: AuthorizationLevel::Automatic,
            estimated_impact: Impact {
                success_rate_delta: estimated_success_delta,
                latency_delta_ms: -100.0,
                cost_delta_per_txn: 0.0,
                affected_traffic_pct: 0.1,
            },
            reasoning: String::new(),
            confidence: 0.9,
            created_at: Utc::now(),
            executed_at: None,
            completed_at: None,
            status: ActionStatus::Executed,
            approver: None,
            actual_impact: None,
        }
    }

    #[test]
    fn record_outcome_sets_actual_impact_and_tracks_history() {
        let clock = FixedClock::at_epoch();
        let mut learner = Learner::new();
        let mut action = sample_action(0.10);
        let baseline = BaselineMetrics {
            success_rate: 0.80,
            avg_latency: 300.0,
            transaction_volume: 100,
            timestamp: clock.now(),
        };
        let actual = BaselineMetrics {
            success_rate: 0.90,
            avg_latency: 250.0,
            transaction_volume: 100,
            timestamp: clock.now(),
        };

        learner.record_outcome(&mut action, baseline, actual, &clock);

        assert!(action.actual_impact.is_some());
        let effectiveness = learner.effectiveness_for(ActionType::NoAction, "HDFC");
        assert_eq!(effectiveness.sample_size, 1);
        assert!((effectiveness.avg_success_improvement - 0.10).abs() < 1e-9);
    }

    #[test]
    fn low_precision_pattern_gets_threshold_raised() {
        let mut learner = Learner::new();
        for _ in 0..2 {
            learner.evaluate_pattern_detection(PatternType::IssuerDegradation, false);
        }
        learner.evaluate_pattern_detection(PatternType::IssuerDegradation, true);

        let thresholds = Thresholds::default();
        let recs = learner.recommend_threshold_adjustments(&thresholds);
        assert_eq!(recs.len(), 1);
        assert!((recs[0].1 - thresholds.issuer_degradation * 1.2).abs() < 1e-9);
    }

    #[test]
    fn weight_update_preserves_normalization_and_never_touches_risk() {
        let mut learner = Learner::new();
        let clock = FixedClock::at_epoch();
        for _ in 0..5 {
            let mut action = sample_action(0.15);
            let baseline = BaselineMetrics {
                success_rate: 0.80,
                avg_latency: 300.0,
                transaction_volume: 100,
                timestamp: clock.now(),
            };
            let actual = BaselineMetrics {
                success_rate: 0.95,
                avg_latency: 200.0,
                transaction_volume: 100,
                timestamp: clock.now(),
            };
            learner.record_outcome(&mut action, baseline, actual, &clock);
        }

        let mut weights = DecisionWeights::default();
        learner.update_decision_weights(&mut weights, 0.1);

        let sum = weights.success_rate + weights.latency + weights.cost + weights.risk;
        assert!((sum - 1.0).abs() < 1e-9);
        // success_rate/latency/cost each moved from 0.40/0.25/0.20 to
        // 0.45/0.30/0.25 pre-normalize (avg score 1.0, lr 0.1); risk is
        // never adjusted, so its post-normalize share is exactly its
        // default divided by the pre-normalize total (1.15).
        assert!((weights.success_rate - 0.45 / 1.15).abs() < 1e-6);
        assert!((weights.risk - 0.15 / 1.15).abs() < 1e-6);
    }
}
