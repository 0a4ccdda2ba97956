//! Root-cause hypotheses the Reasoner attaches to a [`Pattern`](super::pattern::Pattern).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate root cause for a pattern, with a normalised probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: String,
    pub pattern_id: String,
    pub root_cause: String,
    /// Normalised to sum to 1 across siblings of the same pattern.
    pub probability: f64,
    pub supporting_evidence: Vec<String>,
    pub contradicting_evidence: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Normalises `probability` across a sibling set so they sum to 1.
///
/// A no-op on an empty slice; assigns equal weight when every raw weight is
/// zero, so the result is never a set of NaNs.
pub fn normalize_probabilities(hypotheses: &mut [Hypothesis]) {
    let total: f64 = hypotheses.iter().map(|h| h.probability).sum();
    if hypotheses.is_empty() {
        return;
    }
    if total <= 0.0 {
        let equal = 1.0 / hypotheses.len() as f64;
        for h in hypotheses.iter_mut() {
            h.probability = equal;
        }
        return;
    }
    for h in hypotheses.iter_mut() {
        h.probability /= total;
    }
}
