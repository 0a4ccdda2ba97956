//! Orchestrator
//!
//! `Engine` owns every component and coordinates the five-phase cycle
//! Observe → Reason → Decide → Act → Learn. It performs no I/O beyond
//! calling the injected `NotificationSink` and emitting `tracing` events;
//! there is no internal locking, matching a single-threaded cooperative
//! implementation — a caller that needs concurrency wraps `Engine` in its
//! own `Mutex`/`RwLock`.

use crate::clock::{Clock, SystemClock};
use crate::decision::{DecisionContext, DecisionMaker, DecisionWeights};
use crate::errors::CoreError;
use crate::executor::{Executor, NotificationSink, TracingSink};
use crate::learner::Learner;
use crate::model::{
    Action, ActionType, AgentState, Impact, Pattern, PatternType, RiskLevel, SafetyLimits, Transaction,
};
use crate::observer::{ObservationSummary, Observer};
use crate::reasoner::{Reasoner, Thresholds};
use crate::rng::{IdGenerator, UuidGenerator};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Constructor-time configuration, mirroring the original's
/// `PaymentAgent.__init__` parameters plus the safety/decision knobs that
/// used to be implicit module-level defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub window_size_minutes: i64,
    pub auto_approve_low_risk: bool,
    pub safety_limits: SafetyLimits,
    pub decision_weights: DecisionWeights,
    pub thresholds: Thresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            window_size_minutes: 10,
            auto_approve_low_risk: true,
            safety_limits: SafetyLimits::default(),
            decision_weights: DecisionWeights::default(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Pattern severity below this is not worth deciding over — a steady
/// background rate of minor degradation shouldn't trigger the decision
/// pipeline every cycle.
const MIN_SEVERITY_FOR_DECISION: f64 = 0.3;

/// How long an executed action waits before its outcome is recorded —
/// long enough for its effect to show up in the Observer's window.
const LEARNING_EVALUATION_DELAY_MINUTES: i64 = 5;

/// Weight tuning runs once every this many cycles, not every cycle.
const WEIGHT_UPDATE_INTERVAL_CYCLES: u64 = 10;

/// One hypothesis, trimmed to what a cycle report needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisSummary {
    pub root_cause: String,
    pub probability: f64,
}

/// One detected pattern, as it appears in a [`CycleReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub pattern_id: String,
    pub pattern_type: PatternType,
    pub description: String,
    pub severity: f64,
    pub confidence: f64,
    pub affected: String,
    pub hypotheses: Vec<HypothesisSummary>,
}

/// One executed action, as it appears in a [`CycleReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub action_id: String,
    pub action_type: ActionType,
    pub target: String,
    pub risk_level: RiskLevel,
    pub estimated_impact: Impact,
    pub reasoning_summary: String,
}

/// Learning-phase counters surfaced in a [`CycleReport`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LearningUpdates {
    pub total_outcomes: usize,
    pub top_actions: usize,
    pub weights_tuned: bool,
}

/// The full result of one `run_cycle` call. Never wraps a `Result` — any
/// internal failure is captured into `error` and the cycle still advances,
/// matching the original's "no raised condition escapes `runCycle`".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    pub observation_summary: ObservationSummary,
    pub patterns_detected: Vec<PatternReport>,
    pub actions_taken: Vec<ActionReport>,
    pub rollbacks_executed: Vec<String>,
    pub learning_updates: LearningUpdates,
    pub error: Option<String>,
    pub cycle_duration_seconds: f64,
}

fn truncate_reasoning(reasoning: &str) -> String {
    if reasoning.chars().count() > 200 {
        let truncated: String = reasoning.chars().take(200).collect();
        format!("{}...", truncated)
    } else {
        reasoning.to_string()
    }
}

/// Coordinates the Observer, Reasoner, Decision Maker, Executor and Learner
/// through one autonomous control loop. Generic over the clock, id
/// generator and notification sink so tests can supply deterministic
/// doubles; [`ProductionEngine::production`] wires the real ones.
pub struct Engine<C: Clock, I: IdGenerator, S: NotificationSink> {
    pub observer: Observer,
    pub reasoner: Reasoner,
    pub decision_maker: DecisionMaker,
    pub executor: Executor<S>,
    pub learner: Learner,
    pub state: AgentState,

    clock: C,
    ids: I,

    auto_approve_low_risk: bool,
    cycle_count: u64,
}

impl<C: Clock, I: IdGenerator, S: NotificationSink> Engine<C, I, S> {
    pub fn new(config: EngineConfig, clock: C, ids: I, sink: S) -> Self {
        Engine {
            observer: Observer::new(Duration::minutes(config.window_size_minutes)),
            reasoner: Reasoner::new(config.thresholds),
            decision_maker: DecisionMaker::new(config.decision_weights),
            executor: Executor::with_sink(sink),
            learner: Learner::new(),
            state: AgentState::with_limits(config.safety_limits),
            clock,
            ids,
            auto_approve_low_risk: config.auto_approve_low_risk,
            cycle_count: 0,
        }
    }

    /// Rejects malformed transactions before they reach the Observer's
    /// window — the `InputInvalid` boundary. `Transaction::builder` already
    /// validates on construction, so a caller building transactions through
    /// it will never trip this; `ingest` exists so a caller deserializing
    /// untrusted input still gets synchronous rejection rather than a panic
    /// deep inside the window.
    pub fn ingest(&mut self, txn: Transaction) -> Result<(), CoreError> {
        if txn.latency_ms() < 0.0 || !txn.latency_ms().is_finite() {
            return Err(CoreError::InputInvalid(
                "latency_ms must be finite and non-negative".to_string(),
            ));
        }
        self.observer.ingest(&self.clock, txn);
        Ok(())
    }

    pub fn ingest_batch(&mut self, batch: impl IntoIterator<Item = Transaction>) -> Result<(), CoreError> {
        for txn in batch {
            self.ingest(txn)?;
        }
        Ok(())
    }

    /// Direct access to the injected clock, chiefly so tests driving a
    /// `FixedClock` can advance time between cycles.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Runs one Observe → Reason → Decide → Act → Monitor → Learn cycle.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycle_count += 1;
        let cycle_start = self.clock.now();
        tracing::info!(cycle = self.cycle_count, "starting agent cycle");

        let observation_summary = self.observe_phase();

        let mut error = None;
        let patterns = self.reason_phase();
        let (patterns_detected, actions_taken) = match self.decide_and_act_phase(&patterns) {
            Ok(result) => result,
            Err(err) => {
                error = Some(err.to_string());
                (self.pattern_reports(&patterns), Vec::new())
            }
        };

        let rollbacks_executed =
            self.executor
                .monitor_and_rollback(&mut self.state, &self.observer, &self.clock);
        if !rollbacks_executed.is_empty() {
            tracing::warn!(count = rollbacks_executed.len(), "rolled back actions");
        }

        let learning_updates = self.learn_phase();

        self.reasoner.update_baselines(&self.observer);

        let cycle_duration_seconds = (self.clock.now() - cycle_start).num_milliseconds() as f64 / 1000.0;

        tracing::info!(
            cycle = self.cycle_count,
            patterns = patterns_detected.len(),
            actions = actions_taken.len(),
            duration_s = cycle_duration_seconds,
            "cycle complete"
        );

        CycleReport {
            cycle: self.cycle_count,
            timestamp: cycle_start,
            observation_summary,
            patterns_detected,
            actions_taken,
            rollbacks_executed,
            learning_updates,
            error,
            cycle_duration_seconds,
        }
    }

    fn observe_phase(&mut self) -> ObservationSummary {
        self.observer.evict_expired(&self.clock);
        self.state.total_transactions = self.observer.transaction_volume(crate::model::Dimension::Overall, "");
        self.state.overall_success_rate = self.observer.success_rate(crate::model::Dimension::Overall, "");
        self.state.average_latency_ms = self.observer.latency_stats(crate::model::Dimension::Overall, "").mean;
        let summary = self.observer.summary(&self.clock);
        tracing::debug!(
            total = summary.total_transactions,
            success_rate = summary.overall_success_rate,
            "observed window"
        );
        summary
    }

    fn reason_phase(&mut self) -> Vec<Pattern> {
        let patterns = self.reasoner.analyze(&self.observer, &self.clock, &mut self.ids);
        self.state.patterns_detected += patterns.len() as u64;
        tracing::info!(count = patterns.len(), "detected patterns");
        patterns
    }

    fn pattern_reports(&mut self, patterns: &[Pattern]) -> Vec<PatternReport> {
        patterns
            .iter()
            .map(|pattern| {
                let hypotheses = self.reasoner.generate_hypotheses(pattern, &mut self.ids);
                PatternReport {
                    pattern_id: pattern.id.clone(),
                    pattern_type: pattern.pattern_type,
                    description: pattern.description.clone(),
                    severity: pattern.severity,
                    confidence: pattern.confidence,
                    affected: format!("{:?}:{}", pattern.affected_dimension, pattern.affected_value),
                    hypotheses: hypotheses
                        .into_iter()
                        .map(|h| HypothesisSummary {
                            root_cause: h.root_cause,
                            probability: h.probability,
                        })
                        .collect(),
                }
            })
            .collect()
    }

    fn decide_and_act_phase(
        &mut self,
        patterns: &[Pattern],
    ) -> Result<(Vec<PatternReport>, Vec<ActionReport>), CoreError> {
        let reports = self.pattern_reports(patterns);
        let mut actions_taken = Vec::new();

        for pattern in patterns {
            if pattern.severity < MIN_SEVERITY_FOR_DECISION {
                continue;
            }

            let hypotheses = self.reasoner.generate_hypotheses(pattern, &mut self.ids);
            let context = DecisionContext {
                pattern,
                hypotheses: &hypotheses,
                state: &self.state,
            };
            let (action, reasoning) = self.decision_maker.decide(&context, &self.clock, &mut self.ids);

            let Some(mut action) = action else {
                tracing::info!(pattern_id = %pattern.id, reason = %reasoning, "no action selected");
                continue;
            };

            let needs_approval = !(self.auto_approve_low_risk && action.risk_level == RiskLevel::Low);
            if needs_approval && action.authorization_level != crate::model::AuthorizationLevel::Automatic {
                tracing::info!(action_id = %action.id, risk = ?action.risk_level, "action requires approval");
                if action.risk_level == RiskLevel::Medium {
                    action.approver = Some("auto_approved_medium_risk".to_string());
                } else {
                    continue;
                }
            }

            match self.executor.execute(action, &mut self.state, &self.observer, &self.clock) {
                Ok(executed) => {
                    actions_taken.push(ActionReport {
                        action_id: executed.id.clone(),
                        action_type: executed.action_type(),
                        target: executed.target.clone(),
                        risk_level: executed.risk_level,
                        estimated_impact: executed.estimated_impact,
                        reasoning_summary: truncate_reasoning(&executed.reasoning),
                    });
                    self.state.actions_successful += 1;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "action execution failed");
                }
            }
        }

        Ok((reports, actions_taken))
    }

    fn learn_phase(&mut self) -> LearningUpdates {
        let now = self.clock.now();
        let eligible: Vec<Action> = self
            .executor
            .active_interventions()
            .iter()
            .filter(|a| {
                a.actual_impact.is_none()
                    && a.executed_at.is_some_and(|executed_at| {
                        now - executed_at >= Duration::minutes(LEARNING_EVALUATION_DELAY_MINUTES)
                    })
            })
            .cloned()
            .collect();

        for mut action in eligible {
            let baseline = self
                .executor
                .execution_history(usize::MAX)
                .into_iter()
                .find(|entry| entry.action_id == action.id)
                .map(|entry| entry.baseline_metrics);
            let Some(baseline) = baseline else { continue };

            let current = crate::executor::BaselineMetrics {
                success_rate: self.observer.success_rate(crate::model::Dimension::Overall, ""),
                avg_latency: self.observer.latency_stats(crate::model::Dimension::Overall, "").mean,
                transaction_volume: self.observer.transaction_volume(crate::model::Dimension::Overall, ""),
                timestamp: now,
            };

            self.learner.record_outcome(&mut action, baseline, current, &self.clock);
        }

        let summary = self.learner.summary();
        let mut weights_tuned = false;
        if self.cycle_count % WEIGHT_UPDATE_INTERVAL_CYCLES == 0 {
            self.learner.update_decision_weights(&mut self.decision_maker.weights, 0.1);
            weights_tuned = true;
            tracing::info!("updated decision weights based on learning");
        }

        LearningUpdates {
            total_outcomes: summary.total_outcomes_recorded,
            top_actions: summary.top_actions.len(),
            weights_tuned,
        }
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}

/// The concrete, production-configured Engine: real time, UUIDs, and
/// `tracing`-backed alerts.
pub type ProductionEngine = Engine<SystemClock, UuidGenerator, TracingSink>;

impl ProductionEngine {
    pub fn production(config: EngineConfig) -> Self {
        Engine::new(config, SystemClock, UuidGenerator::default(), TracingSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::executor::NoopSink;
    use crate::model::{Money, PaymentMethod, TransactionStatus};
    use crate::rng::DeterministicIdGenerator;
    use rust_decimal_macros::dec;

    fn test_engine() -> Engine<FixedClock, DeterministicIdGenerator, NoopSink> {
        Engine::new(
            EngineConfig::default(),
            FixedClock::at_epoch(),
            DeterministicIdGenerator::new(7),
            NoopSink,
        )
    }

    fn txn(now: DateTime<Utc>, issuer: &str, status: TransactionStatus) -> Transaction {
        Transaction::builder(
            uuid::Uuid::new_v4().to_string(),
            now,
            Money {
                amount: dec!(50),
                currency: "USD".to_string(),
            },
            PaymentMethod::Upi,
            issuer,
            "merchant_1",
            status,
        )
        .latency_ms(120.0)
        .build()
        .unwrap()
    }

    #[test]
    fn run_cycle_never_panics_on_empty_window() {
        let mut engine = test_engine();
        let report = engine.run_cycle();
        assert_eq!(report.cycle, 1);
        assert!(report.error.is_none());
    }

    #[test]
    fn ingest_accepts_well_formed_transactions() {
        let mut engine = test_engine();
        let now = engine.clock.now();
        let txn = txn(now, "HDFC", TransactionStatus::Success);
        assert!(engine.ingest(txn).is_ok());
        assert_eq!(engine.observer.window_len(), 1);
    }

    #[test]
    fn cycle_count_increments_each_call() {
        let mut engine = test_engine();
        engine.run_cycle();
        engine.run_cycle();
        assert_eq!(engine.cycle_count(), 2);
    }

    #[test]
    fn detected_pattern_triggers_an_action_when_severe_enough() {
        let mut engine = test_engine();
        let now = engine.clock.now();

        for i in 0..30 {
            let status = if i < 3 { TransactionStatus::Success } else { TransactionStatus::Failed };
            engine.ingest(txn(now, "HDFC", status)).unwrap();
        }

        let report = engine.run_cycle();
        assert!(report
            .patterns_detected
            .iter()
            .any(|p| p.pattern_type == PatternType::IssuerDegradation));
    }
}
