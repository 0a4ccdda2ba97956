//! The six pattern detectors. Each is a plain, infallible function over the
//! Observer's public read surface; a bug in one cannot suppress the others.

use super::{calculate_confidence, Reasoner};
use crate::clock::Clock;
use crate::model::{Dimension, Pattern, PatternType};
use crate::observer::Observer;
use crate::rng::IdGenerator;
use std::collections::HashMap;

fn metrics(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub(super) fn detect_issuer_degradation(
    reasoner: &Reasoner,
    observer: &Observer,
    clock: &dyn Clock,
    ids: &mut dyn IdGenerator,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for (issuer, health) in observer.issuer_health() {
        let baseline = reasoner.baselines.issuer_baseline(&issuer);
        let degradation = baseline - health.success_rate;

        if health.volume >= 10 && degradation >= reasoner.thresholds.issuer_degradation {
            let severity = (degradation / 0.30).min(1.0);
            let confidence = calculate_confidence(health.volume, degradation);

            patterns.push(Pattern {
                id: ids.next_id(),
                pattern_type: PatternType::IssuerDegradation,
                description: format!(
                    "Issuer {} showing {:.1}% drop in success rate",
                    issuer,
                    degradation * 100.0
                ),
                severity,
                confidence,
                affected_dimension: Dimension::Issuer,
                affected_value: issuer.clone(),
                metrics: metrics(&[
                    ("current_success_rate", health.success_rate),
                    ("baseline_success_rate", baseline),
                    ("degradation", degradation),
                    ("volume", health.volume as f64),
                    ("avg_latency", health.avg_latency_ms),
                ]),
                detected_at: clock.now(),
                evidence: vec![
                    format!(
                        "Success rate: {:.2}% (baseline: {:.2}%)",
                        health.success_rate * 100.0,
                        baseline * 100.0
                    ),
                    format!("Volume: {} transactions", health.volume),
                    format!("Average latency: {:.0}ms", health.avg_latency_ms),
                ],
            });
        }
    }
    patterns
}

pub(super) fn detect_retry_storms(
    reasoner: &Reasoner,
    observer: &Observer,
    clock: &dyn Clock,
    ids: &mut dyn IdGenerator,
) -> Vec<Pattern> {
    let total = observer.transaction_volume(Dimension::Overall, "");
    if total == 0 {
        return Vec::new();
    }

    let retry_count = observer.window().filter(|t| t.is_retry()).count() as u64;
    let retry_percentage = retry_count as f64 / total as f64;
    let retry_efficiency = observer.retry_efficiency();

    if retry_percentage < reasoner.thresholds.retry_storm {
        return Vec::new();
    }

    let severity = (retry_percentage / 0.60).min(1.0);
    let confidence = calculate_confidence(total, retry_percentage - 0.20);

    vec![Pattern {
        id: ids.next_id(),
        pattern_type: PatternType::RetryStorm,
        description: format!(
            "{:.1}% of traffic is retries with {:.1}% success rate",
            retry_percentage * 100.0,
            retry_efficiency * 100.0
        ),
        severity,
        confidence,
        affected_dimension: Dimension::Overall,
        affected_value: "retry_behavior".to_string(),
        metrics: metrics(&[
            ("retry_percentage", retry_percentage),
            ("retry_efficiency", retry_efficiency),
            ("total_retries", retry_count as f64),
            ("total_transactions", total as f64),
        ]),
        detected_at: clock.now(),
        evidence: vec![
            format!("Retry percentage: {:.1}%", retry_percentage * 100.0),
            format!("Retry efficiency: {:.1}%", retry_efficiency * 100.0),
            format!("{} retries out of {} transactions", retry_count, total),
        ],
    }]
}

pub(super) fn detect_method_fatigue(
    reasoner: &Reasoner,
    observer: &Observer,
    clock: &dyn Clock,
    ids: &mut dyn IdGenerator,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for (method, perf) in observer.method_performance() {
        let baseline = reasoner.baselines.method_baseline(&method);
        let degradation = baseline - perf.success_rate;

        if perf.volume >= 20 && degradation >= reasoner.thresholds.method_fatigue {
            let severity = (degradation / 0.40).min(1.0);
            let confidence = calculate_confidence(perf.volume, degradation);

            patterns.push(Pattern {
                id: ids.next_id(),
                pattern_type: PatternType::MethodFatigue,
                description: format!(
                    "Payment method {} showing {:.1}% drop in success rate",
                    method,
                    degradation * 100.0
                ),
                severity,
                confidence,
                affected_dimension: Dimension::Method,
                affected_value: method.clone(),
                metrics: metrics(&[
                    ("current_success_rate", perf.success_rate),
                    ("baseline_success_rate", baseline),
                    ("degradation", degradation),
                    ("volume", perf.volume as f64),
                ]),
                detected_at: clock.now(),
                evidence: vec![
                    format!(
                        "Success rate: {:.2}% (baseline: {:.2}%)",
                        perf.success_rate * 100.0,
                        baseline * 100.0
                    ),
                    format!("Volume: {} transactions", perf.volume),
                    format!("Degradation: {:.1}%", degradation * 100.0),
                ],
            });
        }
    }
    patterns
}

pub(super) fn detect_latency_spikes(
    reasoner: &Reasoner,
    observer: &Observer,
    clock: &dyn Clock,
    ids: &mut dyn IdGenerator,
) -> Vec<Pattern> {
    let latency = observer.latency_stats(Dimension::Overall, "");
    let baseline = reasoner.baselines.avg_latency_ms;
    let current_p95 = latency.p95;

    if current_p95 <= baseline * reasoner.thresholds.latency_spike {
        return Vec::new();
    }

    let spike_factor = current_p95 / baseline;
    let severity = ((spike_factor - 1.0) / 2.0).min(1.0);
    let confidence = 0.8;

    vec![Pattern {
        id: ids.next_id(),
        pattern_type: PatternType::LatencySpike,
        description: format!(
            "P95 latency at {:.0}ms ({:.1}x baseline)",
            current_p95, spike_factor
        ),
        severity,
        confidence,
        affected_dimension: Dimension::Overall,
        affected_value: "latency".to_string(),
        metrics: metrics(&[
            ("p50", latency.p50),
            ("p95", latency.p95),
            ("p99", latency.p99),
            ("mean", latency.mean),
            ("baseline", baseline),
            ("spike_factor", spike_factor),
        ]),
        detected_at: clock.now(),
        evidence: vec![
            format!("P95 latency: {:.0}ms (baseline: {:.0}ms)", current_p95, baseline),
            format!("Spike factor: {:.1}x", spike_factor),
            format!("P99 latency: {:.0}ms", latency.p99),
        ],
    }]
}

pub(super) fn detect_error_clusters(
    reasoner: &Reasoner,
    observer: &Observer,
    clock: &dyn Clock,
    ids: &mut dyn IdGenerator,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    let total = observer.transaction_volume(Dimension::Overall, "").max(1);

    for (error_code, count) in observer.top_errors(5) {
        if count < reasoner.thresholds.error_cluster {
            continue;
        }
        let error_rate = count as f64 / total as f64;
        let severity = (error_rate / 0.10).min(1.0);
        let confidence = calculate_confidence(count, error_rate);

        patterns.push(Pattern {
            id: ids.next_id(),
            pattern_type: PatternType::ErrorCluster,
            description: format!(
                "Error {} occurring {} times ({:.1}% of traffic)",
                error_code,
                count,
                error_rate * 100.0
            ),
            severity,
            confidence,
            affected_dimension: Dimension::Overall,
            affected_value: error_code.clone(),
            metrics: metrics(&[
                ("error_count", count as f64),
                ("total_transactions", total as f64),
                ("error_rate", error_rate),
            ]),
            detected_at: clock.now(),
            evidence: vec![
                format!("Error code: {}", error_code),
                format!("Occurrences: {}", count),
                format!("Error rate: {:.1}%", error_rate * 100.0),
            ],
        });
    }
    patterns
}

pub(super) fn detect_geographic_issues(
    reasoner: &Reasoner,
    observer: &Observer,
    clock: &dyn Clock,
    ids: &mut dyn IdGenerator,
) -> Vec<Pattern> {
    let mut region_totals: HashMap<String, (u64, u64)> = HashMap::new();
    for txn in observer.window() {
        let entry = region_totals.entry(txn.region().to_string()).or_insert((0, 0));
        entry.1 += 1;
        if txn.status() == crate::model::TransactionStatus::Success {
            entry.0 += 1;
        }
    }

    let overall_rate = observer.success_rate(Dimension::Overall, "");
    let mut patterns = Vec::new();

    for (region, (success, total)) in region_totals {
        if total < 10 {
            continue;
        }
        let success_rate = success as f64 / total as f64;
        let degradation = overall_rate - success_rate;

        if degradation >= reasoner.thresholds.geographic_issue {
            let severity = (degradation / 0.40).min(1.0);
            let confidence = calculate_confidence(total, degradation);

            patterns.push(Pattern {
                id: ids.next_id(),
                pattern_type: PatternType::GeographicIssue,
                description: format!(
                    "Region {} has {:.1}% success rate vs {:.1}% overall",
                    region,
                    success_rate * 100.0,
                    overall_rate * 100.0
                ),
                severity,
                confidence,
                affected_dimension: Dimension::Region,
                affected_value: region.clone(),
                metrics: metrics(&[
                    ("region_success_rate", success_rate),
                    ("overall_success_rate", overall_rate),
                    ("degradation", degradation),
                    ("volume", total as f64),
                ]),
                detected_at: clock.now(),
                evidence: vec![
                    format!("Region success rate: {:.2}%", success_rate * 100.0),
                    format!("Overall success rate: {:.2}%", overall_rate * 100.0),
                    format!("Volume: {} transactions", total),
                ],
            });
        }
    }
    patterns
}
