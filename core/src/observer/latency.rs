//! Fixed-capacity latency ring and the percentile summary computed from it.

use serde::Serialize;
use std::collections::VecDeque;

/// Mean/p50/p95/p99/max over the samples currently retained in a ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

impl Default for LatencyStats {
    fn default() -> Self {
        LatencyStats {
            mean: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
            max: 0.0,
        }
    }
}

/// A ring buffer capped at construction; `push` evicts the oldest sample
/// once full. Percentiles are computed on demand by sorting a copy — cheap
/// at the capacities this type is used at (≤1000 samples).
#[derive(Debug, Clone)]
pub struct LatencyRing {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl LatencyRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        LatencyRing {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn stats(&self) -> LatencyStats {
        if self.samples.is_empty() {
            return LatencyStats::default();
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        let max = *sorted.last().unwrap();

        LatencyStats {
            mean,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
            max,
        }
    }
}

/// Nearest-rank percentile over an already-sorted slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_sample_past_capacity() {
        let mut ring = LatencyRing::new(3);
        ring.push(1.0);
        ring.push(2.0);
        ring.push(3.0);
        ring.push(4.0);
        assert_eq!(ring.len(), 3);
        let stats = ring.stats();
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn empty_ring_has_zeroed_stats() {
        let ring = LatencyRing::new(10);
        assert_eq!(ring.stats(), LatencyStats::default());
    }

    #[test]
    fn p50_of_uniform_samples_is_near_median() {
        let mut ring = LatencyRing::new(100);
        for i in 1..=100 {
            ring.push(i as f64);
        }
        let stats = ring.stats();
        assert!((stats.p50 - 50.5).abs() < 1.0);
    }
}
