//! Basic, threshold-only anomaly surfacing — coarser and cheaper than the
//! Reasoner's pattern detectors, and exposed raw alongside them.

use super::Observer;
use crate::model::Dimension;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub anomaly_type: String,
    pub severity: f64,
    pub affected: Option<String>,
    pub message: String,
}

pub(super) fn detect(observer: &Observer) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    let overall_success = observer.success_rate(Dimension::Overall, "");
    if overall_success < 0.85 {
        anomalies.push(Anomaly {
            anomaly_type: "low_success_rate".to_string(),
            severity: 1.0 - overall_success,
            affected: None,
            message: format!(
                "Overall success rate dropped to {:.2}%",
                overall_success * 100.0
            ),
        });
    }

    for (issuer, health) in observer.issuer_health() {
        if health.success_rate < 0.80 && health.volume >= 10 {
            anomalies.push(Anomaly {
                anomaly_type: "issuer_degradation".to_string(),
                severity: 1.0 - health.success_rate,
                affected: Some(issuer.clone()),
                message: format!(
                    "Issuer {} has {:.2}% success rate",
                    issuer,
                    health.success_rate * 100.0
                ),
            });
        }
    }

    let latency = observer.latency_stats(Dimension::Overall, "");
    if latency.p95 > 1000.0 {
        anomalies.push(Anomaly {
            anomaly_type: "high_latency".to_string(),
            severity: (latency.p95 / 2000.0).min(1.0),
            affected: None,
            message: format!("P95 latency at {:.0}ms", latency.p95),
        });
    }

    let retry_efficiency = observer.retry_efficiency();
    if retry_efficiency < 0.30 && observer.retry_chains_tracked() >= 10 {
        anomalies.push(Anomaly {
            anomaly_type: "low_retry_efficiency".to_string(),
            severity: 1.0 - retry_efficiency,
            affected: None,
            message: format!("Retry success rate only {:.2}%", retry_efficiency * 100.0),
        });
    }

    anomalies
}
