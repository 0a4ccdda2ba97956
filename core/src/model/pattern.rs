//! Degradation patterns produced by the Reasoner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The six families of degradation the Reasoner detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    IssuerDegradation,
    RetryStorm,
    MethodFatigue,
    LatencySpike,
    ErrorCluster,
    GeographicIssue,
}

/// The stats dimension a pattern (or counter) is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Overall,
    Issuer,
    Method,
    Region,
    Merchant,
}

/// A detected degradation pattern, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub pattern_type: PatternType,
    pub description: String,
    /// In `[0, 1]`.
    pub severity: f64,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub affected_dimension: Dimension,
    pub affected_value: String,
    pub metrics: HashMap<String, f64>,
    pub detected_at: DateTime<Utc>,
    pub evidence: Vec<String>,
}

impl Pattern {
    /// Clamps severity and confidence into `[0, 1]` — callers compute raw
    /// ratios that can slightly overshoot at the boundary.
    pub fn clamp_unit_fields(&mut self) {
        self.severity = self.severity.clamp(0.0, 1.0);
        self.confidence = self.confidence.clamp(0.0, 1.0);
    }
}
