//! Root-cause hypothesis generation, one function per pattern type, mirroring
//! the fixed library of candidate causes and their initial probabilities.

use crate::model::{normalize_probabilities, Hypothesis, Pattern, PatternType};
use crate::rng::IdGenerator;
use chrono::{DateTime, Utc};

pub(super) fn generate(pattern: &Pattern, ids: &mut dyn IdGenerator) -> Vec<Hypothesis> {
    let mut hypotheses = match pattern.pattern_type {
        PatternType::IssuerDegradation => issuer(pattern, ids),
        PatternType::RetryStorm => retry(pattern, ids),
        PatternType::MethodFatigue => method(pattern, ids),
        PatternType::LatencySpike => latency(pattern, ids),
        PatternType::ErrorCluster => error(pattern, ids),
        PatternType::GeographicIssue => geographic(pattern, ids),
    };
    normalize_probabilities(&mut hypotheses);
    hypotheses
}

fn hyp(
    ids: &mut dyn IdGenerator,
    pattern_id: &str,
    root_cause: &str,
    probability: f64,
    supporting: Vec<String>,
    contradicting: Vec<String>,
    now: DateTime<Utc>,
) -> Hypothesis {
    Hypothesis {
        id: ids.next_id(),
        pattern_id: pattern_id.to_string(),
        root_cause: root_cause.to_string(),
        probability,
        supporting_evidence: supporting,
        contradicting_evidence: contradicting,
        created_at: now,
    }
}

fn issuer(pattern: &Pattern, ids: &mut dyn IdGenerator) -> Vec<Hypothesis> {
    let now = pattern.detected_at;
    let current_success_rate = pattern.metrics.get("current_success_rate").copied().unwrap_or(0.0);
    let degradation = pattern.metrics.get("degradation").copied().unwrap_or(0.0);
    let avg_latency = pattern.metrics.get("avg_latency").copied().unwrap_or(0.0);

    let down_probability = if current_success_rate < 0.20 { 0.6 } else { 0.3 };
    let throttle_probability = if avg_latency > 500.0 { 0.5 } else { 0.3 };

    vec![
        hyp(
            ids,
            &pattern.id,
            "issuer_down",
            down_probability,
            vec![
                format!("Success rate critically low: {:.1}%", current_success_rate * 100.0),
                format!("Sudden degradation of {:.1}%", degradation * 100.0),
            ],
            if current_success_rate > 0.10 {
                vec!["Some transactions still succeeding".to_string()]
            } else {
                vec![]
            },
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "issuer_throttling",
            throttle_probability,
            vec![
                format!("Elevated latency: {:.0}ms", avg_latency),
                format!("Partial success rate: {:.1}%", current_success_rate * 100.0),
            ],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "network_issue",
            0.2,
            vec!["Degradation pattern consistent with connectivity issues".to_string()],
            vec![],
            now,
        ),
    ]
}

fn retry(pattern: &Pattern, ids: &mut dyn IdGenerator) -> Vec<Hypothesis> {
    let now = pattern.detected_at;
    let retry_percentage = pattern.metrics.get("retry_percentage").copied().unwrap_or(0.0);
    let retry_efficiency = pattern.metrics.get("retry_efficiency").copied().unwrap_or(0.0);
    let total_retries = pattern.metrics.get("total_retries").copied().unwrap_or(0.0);

    vec![
        hyp(
            ids,
            &pattern.id,
            "aggressive_retry_config",
            0.5,
            vec![
                format!("High retry percentage: {:.1}%", retry_percentage * 100.0),
                format!("Low retry efficiency: {:.1}%", retry_efficiency * 100.0),
            ],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "cascading_failures",
            0.3,
            vec![
                "Retries may be causing additional system load".to_string(),
                format!("Total retries: {:.0}", total_retries),
            ],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "upstream_issue",
            0.2,
            vec!["Multiple retries failing suggests upstream problem".to_string()],
            vec![],
            now,
        ),
    ]
}

fn method(pattern: &Pattern, ids: &mut dyn IdGenerator) -> Vec<Hypothesis> {
    let now = pattern.detected_at;
    vec![
        hyp(
            ids,
            &pattern.id,
            "fraud_detection_triggers",
            0.4,
            vec!["Repeated attempts may trigger fraud systems".to_string()],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "user_cancellation",
            0.3,
            vec!["Users may be canceling after failed retries".to_string()],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "method_limits",
            0.3,
            vec!["Payment method may have transaction limits".to_string()],
            vec![],
            now,
        ),
    ]
}

fn latency(pattern: &Pattern, ids: &mut dyn IdGenerator) -> Vec<Hypothesis> {
    let now = pattern.detected_at;
    let spike_factor = pattern.metrics.get("spike_factor").copied().unwrap_or(1.0);
    vec![
        hyp(
            ids,
            &pattern.id,
            "system_load",
            0.4,
            vec![format!("Latency spike factor: {:.1}x", spike_factor)],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "network_congestion",
            0.3,
            vec!["Latency affecting all transactions".to_string()],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "downstream_slowness",
            0.3,
            vec!["Banks/processors may be slow".to_string()],
            vec![],
            now,
        ),
    ]
}

fn error(pattern: &Pattern, ids: &mut dyn IdGenerator) -> Vec<Hypothesis> {
    let now = pattern.detected_at;
    vec![
        hyp(
            ids,
            &pattern.id,
            "specific_error_condition",
            0.6,
            vec![format!("Error {} highly concentrated", pattern.affected_value)],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "configuration_issue",
            0.4,
            vec!["Systematic error pattern suggests config problem".to_string()],
            vec![],
            now,
        ),
    ]
}

fn geographic(pattern: &Pattern, ids: &mut dyn IdGenerator) -> Vec<Hypothesis> {
    let now = pattern.detected_at;
    vec![
        hyp(
            ids,
            &pattern.id,
            "regional_network_outage",
            0.5,
            vec![format!("Region {} significantly degraded", pattern.affected_value)],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "regional_bank_issue",
            0.3,
            vec!["May affect specific banks in region".to_string()],
            vec![],
            now,
        ),
        hyp(
            ids,
            &pattern.id,
            "compliance_block",
            0.2,
            vec!["Could be regulatory/compliance issue".to_string()],
            vec![],
            now,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimension;
    use crate::rng::DeterministicIdGenerator;
    use chrono::Utc;
    use std::collections::HashMap;

    fn sample_pattern() -> Pattern {
        let mut metrics = HashMap::new();
        metrics.insert("current_success_rate".to_string(), 0.10);
        metrics.insert("degradation".to_string(), 0.30);
        metrics.insert("avg_latency".to_string(), 600.0);

        Pattern {
            id: "p1".to_string(),
            pattern_type: PatternType::IssuerDegradation,
            description: String::new(),
            severity: 0.8,
            confidence: 0.7,
            affected_dimension: Dimension::Issuer,
            affected_value: "HDFC".to_string(),
            metrics,
            detected_at: Utc::now(),
            evidence: vec![],
        }
    }

    #[test]
    fn issuer_hypotheses_sum_to_one() {
        let mut ids = DeterministicIdGenerator::new(1);
        let hyps = generate(&sample_pattern(), &mut ids);
        let sum: f64 = hyps.iter().map(|h| h.probability).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(hyps.len(), 3);
    }
}
