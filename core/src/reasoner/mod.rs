//! Reasoner
//!
//! Detects the six families of degradation pattern against learned
//! baselines, attaches root-cause hypotheses, and updates baselines from
//! healthy observation.

mod detectors;
mod hypotheses;

use crate::clock::Clock;
use crate::model::{Dimension, Hypothesis, Pattern, PatternType};
use crate::observer::Observer;
use crate::rng::IdGenerator;
use std::collections::HashMap;

/// Detection thresholds, exposed so the Learner can recommend adjustments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub issuer_degradation: f64,
    pub method_fatigue: f64,
    pub latency_spike: f64,
    pub retry_storm: f64,
    pub error_cluster: u64,
    pub geographic_issue: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            issuer_degradation: 0.15,
            method_fatigue: 0.20,
            latency_spike: 1.5,
            retry_storm: 0.40,
            error_cluster: 10,
            geographic_issue: 0.20,
        }
    }
}

/// Learned baselines the detectors compare the current window against.
#[derive(Debug, Clone, PartialEq)]
pub struct Baselines {
    pub overall_success_rate: f64,
    pub issuer_success_rates: HashMap<String, f64>,
    pub method_success_rates: HashMap<String, f64>,
    pub avg_latency_ms: f64,
    pub retry_efficiency: f64,
}

impl Default for Baselines {
    fn default() -> Self {
        Baselines {
            overall_success_rate: 0.95,
            issuer_success_rates: HashMap::new(),
            method_success_rates: HashMap::new(),
            avg_latency_ms: 200.0,
            retry_efficiency: 0.60,
        }
    }
}

impl Thresholds {
    /// Reads the threshold for `pattern_type` as `f64`; the `error_cluster`
    /// threshold is a raw count, widened for the Learner's multiplicative
    /// adjustment.
    pub fn get(&self, pattern_type: PatternType) -> f64 {
        match pattern_type {
            PatternType::IssuerDegradation => self.issuer_degradation,
            PatternType::MethodFatigue => self.method_fatigue,
            PatternType::LatencySpike => self.latency_spike,
            PatternType::RetryStorm => self.retry_storm,
            PatternType::ErrorCluster => self.error_cluster as f64,
            PatternType::GeographicIssue => self.geographic_issue,
        }
    }

    /// Writes back an adjusted threshold; `error_cluster` is rounded to the
    /// nearest whole transaction count.
    pub fn set(&mut self, pattern_type: PatternType, value: f64) {
        match pattern_type {
            PatternType::IssuerDegradation => self.issuer_degradation = value,
            PatternType::MethodFatigue => self.method_fatigue = value,
            PatternType::LatencySpike => self.latency_spike = value,
            PatternType::RetryStorm => self.retry_storm = value,
            PatternType::ErrorCluster => self.error_cluster = value.round().max(0.0) as u64,
            PatternType::GeographicIssue => self.geographic_issue = value,
        }
    }
}

impl Baselines {
    fn issuer_baseline(&self, issuer: &str) -> f64 {
        self.issuer_success_rates.get(issuer).copied().unwrap_or(0.95)
    }

    fn method_baseline(&self, method: &str) -> f64 {
        self.method_success_rates.get(method).copied().unwrap_or(0.95)
    }
}

pub struct Reasoner {
    pub thresholds: Thresholds,
    pub baselines: Baselines,
}

impl Default for Reasoner {
    fn default() -> Self {
        Reasoner {
            thresholds: Thresholds::default(),
            baselines: Baselines::default(),
        }
    }
}

impl Reasoner {
    pub fn new(thresholds: Thresholds) -> Self {
        Reasoner {
            thresholds,
            baselines: Baselines::default(),
        }
    }

    /// Runs every detector independently and returns the union, sorted by
    /// severity descending. A detector returning an empty vec never
    /// suppresses the others — each is a plain, infallible function over
    /// the observer's public read surface.
    pub fn analyze(
        &self,
        observer: &Observer,
        clock: &dyn Clock,
        ids: &mut dyn IdGenerator,
    ) -> Vec<Pattern> {
        let mut patterns = Vec::new();
        patterns.extend(detectors::detect_issuer_degradation(self, observer, clock, ids));
        patterns.extend(detectors::detect_retry_storms(self, observer, clock, ids));
        patterns.extend(detectors::detect_method_fatigue(self, observer, clock, ids));
        patterns.extend(detectors::detect_latency_spikes(self, observer, clock, ids));
        patterns.extend(detectors::detect_error_clusters(self, observer, clock, ids));
        patterns.extend(detectors::detect_geographic_issues(self, observer, clock, ids));

        patterns.sort_by(|a, b| b.severity.partial_cmp(&a.severity).unwrap());
        patterns
    }

    pub fn generate_hypotheses(&self, pattern: &Pattern, ids: &mut dyn IdGenerator) -> Vec<Hypothesis> {
        hypotheses::generate(pattern, ids)
    }

    /// EMA baseline update: only moves toward observations judged healthy.
    pub fn update_baselines(&mut self, observer: &Observer) {
        const ALPHA: f64 = 0.1;

        let overall_success = observer.success_rate(Dimension::Overall, "");
        if overall_success >= 0.90 {
            self.baselines.overall_success_rate =
                0.9 * self.baselines.overall_success_rate + ALPHA * overall_success;
        }

        for (issuer, health) in observer.issuer_health() {
            if health.success_rate >= 0.90 && health.volume >= 20 {
                let current = self.baselines.issuer_baseline(&issuer);
                self.baselines
                    .issuer_success_rates
                    .insert(issuer, 0.9 * current + ALPHA * health.success_rate);
            }
        }

        let latency = observer.latency_stats(Dimension::Overall, "");
        if latency.mean > 0.0 {
            self.baselines.avg_latency_ms = 0.9 * self.baselines.avg_latency_ms + ALPHA * latency.mean;
        }
    }
}

/// `sqrt(sigmoid(0.05 * (n - 50)) * min(effect / 0.30, 1))`, clamped to
/// `[0, 1]` — larger samples and stronger effects both raise confidence.
pub(crate) fn calculate_confidence(sample_size: u64, effect_size: f64) -> f64 {
    let size_confidence = 1.0 / (1.0 + (-0.05 * (sample_size as f64 - 50.0)).exp());
    let effect_confidence = (effect_size / 0.30).min(1.0).max(0.0);
    (size_confidence * effect_confidence).sqrt().clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_increases_with_sample_size() {
        let low_n = calculate_confidence(5, 0.20);
        let high_n = calculate_confidence(500, 0.20);
        assert!(high_n > low_n);
    }

    #[test]
    fn confidence_is_clamped_to_unit_interval() {
        let c = calculate_confidence(10_000, 10.0);
        assert!((0.0..=1.0).contains(&c));
    }
}
