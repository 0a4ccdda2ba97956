//! The single trait boundary the core crosses to reach the outside world.

use crate::model::PatternType;
use chrono::{DateTime, Utc};

/// An ops-facing alert raised by an `alert_ops` action.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub pattern_type: PatternType,
    pub severity: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Where `alert_ops` actions go. A real embedder wires this to PagerDuty,
/// Slack, or similar; the core only ever calls `notify`.
pub trait NotificationSink {
    fn notify(&self, alert: &Alert);
}

/// Discards every alert. Used in tests and anywhere notifications are
/// genuinely not wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn notify(&self, _alert: &Alert) {}
}

/// Default production sink: emits a structured `tracing` event at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, alert: &Alert) {
        tracing::warn!(
            pattern_type = ?alert.pattern_type,
            severity = alert.severity,
            description = %alert.description,
            "payment alert"
        );
    }
}
