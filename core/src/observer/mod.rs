//! Observer
//!
//! Ingests payment transactions into a sliding time window and maintains
//! live per-dimension statistics, latency percentiles, retry-chain
//! tracking, and basic anomaly surfacing.
//!
//! Before every mutation and every window-sensitive read, the window is
//! swept of entries older than `now - window_size`; eviction decrements the
//! same counters ingestion incremented, so `stats[dim][key].total ==
//! success + failed` holds at every observable point.

mod anomaly;
mod latency;

pub use anomaly::Anomaly;
pub use latency::{LatencyRing, LatencyStats};

use crate::clock::Clock;
use crate::model::{Dimension, PaymentMethod, Transaction, TransactionStatus};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// Live success/failed/total counter for one dimension key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DimCounter {
    pub success: u64,
    pub failed: u64,
    pub total: u64,
}

impl DimCounter {
    fn record(&mut self, status: TransactionStatus) {
        match status {
            TransactionStatus::Success => self.success += 1,
            _ => self.failed += 1,
        }
        self.total += 1;
    }

    fn unrecord(&mut self, status: TransactionStatus) {
        match status {
            TransactionStatus::Success => self.success = self.success.saturating_sub(1),
            _ => self.failed = self.failed.saturating_sub(1),
        }
        self.total = self.total.saturating_sub(1);
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.success as f64 / self.total as f64
        }
    }
}

/// Attempted/succeeded counts for one retry chain (keyed by
/// [`Transaction::retry_chain_key`]).
#[derive(Debug, Clone, Copy, Default)]
struct RetryChainStats {
    attempted: u64,
    succeeded: u64,
}

/// Per-dimension health snapshot returned by `issuer_health`/`method_performance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimHealth {
    pub success_rate: f64,
    pub failure_rate: f64,
    pub volume: u64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
}

/// A point-in-time rollup of the Observer's state, as returned by
/// [`Observer::summary`] and embedded in a `CycleReport`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSummary {
    pub window_size_minutes: f64,
    pub total_transactions: usize,
    pub overall_success_rate: f64,
    pub overall_latency: LatencyStats,
    pub retry_efficiency: f64,
    pub top_errors: Vec<(String, u64)>,
    pub issuer_count: usize,
    pub method_count: usize,
    pub anomalies: Vec<Anomaly>,
}

/// Maintains the sliding-window statistics the Reasoner analyses each cycle.
pub struct Observer {
    window_size: chrono::Duration,

    window: VecDeque<Transaction>,

    overall: DimCounter,
    by_issuer: HashMap<String, DimCounter>,
    by_method: HashMap<String, DimCounter>,
    by_region: HashMap<String, DimCounter>,
    by_merchant: HashMap<String, DimCounter>,

    overall_latency: LatencyRing,
    issuer_latency: HashMap<String, LatencyRing>,
    method_latency: HashMap<String, LatencyRing>,

    error_codes: HashMap<String, u64>,

    retry_stats: HashMap<String, RetryChainStats>,
}

const OVERALL_LATENCY_CAPACITY: usize = 1000;
const PER_KEY_LATENCY_CAPACITY: usize = 100;

impl Observer {
    pub fn new(window_size: chrono::Duration) -> Self {
        Observer {
            window_size,
            window: VecDeque::new(),
            overall: DimCounter::default(),
            by_issuer: HashMap::new(),
            by_method: HashMap::new(),
            by_region: HashMap::new(),
            by_merchant: HashMap::new(),
            overall_latency: LatencyRing::new(OVERALL_LATENCY_CAPACITY),
            issuer_latency: HashMap::new(),
            method_latency: HashMap::new(),
            error_codes: HashMap::new(),
            retry_stats: HashMap::new(),
        }
    }

    /// Ingests one transaction: evicts stale entries, then records the new
    /// one into every per-dimension counter, the latency rings, error
    /// tallies, and retry-chain tracking.
    pub fn ingest(&mut self, clock: &dyn Clock, txn: Transaction) {
        self.evict_expired(clock);
        self.record(&txn);
        self.window.push_back(txn);
    }

    pub fn ingest_batch(&mut self, clock: &dyn Clock, batch: impl IntoIterator<Item = Transaction>) {
        for txn in batch {
            self.ingest(clock, txn);
        }
    }

    fn record(&mut self, txn: &Transaction) {
        self.overall.record(txn.status());
        self.by_issuer
            .entry(txn.issuer().to_string())
            .or_default()
            .record(txn.status());
        self.by_method
            .entry(txn.payment_method().as_tag().to_string())
            .or_default()
            .record(txn.status());
        self.by_region
            .entry(txn.region().to_string())
            .or_default()
            .record(txn.status());
        self.by_merchant
            .entry(txn.merchant_id().to_string())
            .or_default()
            .record(txn.status());

        if txn.latency_ms() > 0.0 {
            self.overall_latency.push(txn.latency_ms());
            self.issuer_latency
                .entry(txn.issuer().to_string())
                .or_insert_with(|| LatencyRing::new(PER_KEY_LATENCY_CAPACITY))
                .push(txn.latency_ms());
            self.method_latency
                .entry(txn.payment_method().as_tag().to_string())
                .or_insert_with(|| LatencyRing::new(PER_KEY_LATENCY_CAPACITY))
                .push(txn.latency_ms());
        }

        if txn.status() == TransactionStatus::Failed {
            if let Some(code) = txn.error_code() {
                *self.error_codes.entry(code.to_string()).or_insert(0) += 1;
            }
        }

        if txn.is_retry() {
            let chain = self.retry_stats.entry(txn.retry_chain_key().to_string()).or_default();
            chain.attempted += 1;
            if txn.status() == TransactionStatus::Success {
                chain.succeeded += 1;
            }
        }
    }

    fn unrecord(&mut self, txn: &Transaction) {
        self.overall.unrecord(txn.status());
        if let Some(c) = self.by_issuer.get_mut(txn.issuer()) {
            c.unrecord(txn.status());
        }
        if let Some(c) = self.by_method.get_mut(txn.payment_method().as_tag()) {
            c.unrecord(txn.status());
        }
        if let Some(c) = self.by_region.get_mut(txn.region()) {
            c.unrecord(txn.status());
        }
        if let Some(c) = self.by_merchant.get_mut(txn.merchant_id()) {
            c.unrecord(txn.status());
        }
        // Latency rings and error/retry tallies are append-only histories,
        // not window-scoped counters — they are not reversed on eviction.
    }

    /// Evicts every transaction older than `now - window_size`, decrementing
    /// the counters that ingestion incremented.
    pub fn evict_expired(&mut self, clock: &dyn Clock) {
        let cutoff = clock.now() - self.window_size;
        while let Some(front) = self.window.front() {
            if front.timestamp() < cutoff {
                let expired = self.window.pop_front().unwrap();
                self.unrecord(&expired);
            } else {
                break;
            }
        }
    }

    fn counter(&self, dimension: Dimension, key: &str) -> DimCounter {
        match dimension {
            Dimension::Overall => self.overall,
            Dimension::Issuer => self.by_issuer.get(key).copied().unwrap_or_default(),
            Dimension::Method => self.by_method.get(key).copied().unwrap_or_default(),
            Dimension::Region => self.by_region.get(key).copied().unwrap_or_default(),
            Dimension::Merchant => self.by_merchant.get(key).copied().unwrap_or_default(),
        }
    }

    pub fn success_rate(&self, dimension: Dimension, key: &str) -> f64 {
        self.counter(dimension, key).success_rate()
    }

    pub fn failure_rate(&self, dimension: Dimension, key: &str) -> f64 {
        1.0 - self.success_rate(dimension, key)
    }

    pub fn transaction_volume(&self, dimension: Dimension, key: &str) -> u64 {
        self.counter(dimension, key).total
    }

    pub fn latency_stats(&self, dimension: Dimension, key: &str) -> LatencyStats {
        match dimension {
            Dimension::Overall => self.overall_latency.stats(),
            Dimension::Issuer => self
                .issuer_latency
                .get(key)
                .map(|r| r.stats())
                .unwrap_or_default(),
            Dimension::Method => self
                .method_latency
                .get(key)
                .map(|r| r.stats())
                .unwrap_or_default(),
            Dimension::Region | Dimension::Merchant => LatencyStats::default(),
        }
    }

    pub fn retry_efficiency(&self) -> f64 {
        if self.retry_stats.is_empty() {
            return 1.0;
        }
        let attempted: u64 = self.retry_stats.values().map(|s| s.attempted).sum();
        let succeeded: u64 = self.retry_stats.values().map(|s| s.succeeded).sum();
        if attempted == 0 {
            1.0
        } else {
            succeeded as f64 / attempted as f64
        }
    }

    pub fn retry_chains_tracked(&self) -> usize {
        self.retry_stats.len()
    }

    pub fn top_errors(&self, n: usize) -> Vec<(String, u64)> {
        let mut errors: Vec<(String, u64)> =
            self.error_codes.iter().map(|(k, v)| (k.clone(), *v)).collect();
        errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        errors.truncate(n);
        errors
    }

    pub fn issuer_health(&self) -> HashMap<String, DimHealth> {
        self.dim_health(&self.by_issuer, Dimension::Issuer)
    }

    pub fn method_performance(&self) -> HashMap<String, DimHealth> {
        self.dim_health(&self.by_method, Dimension::Method)
    }

    fn dim_health(
        &self,
        counters: &HashMap<String, DimCounter>,
        dimension: Dimension,
    ) -> HashMap<String, DimHealth> {
        let mut out = HashMap::new();
        for (key, counter) in counters {
            if counter.total == 0 {
                continue;
            }
            let latency = self.latency_stats(dimension, key);
            out.insert(
                key.clone(),
                DimHealth {
                    success_rate: counter.success_rate(),
                    failure_rate: 1.0 - counter.success_rate(),
                    volume: counter.total,
                    avg_latency_ms: latency.mean,
                    p95_latency_ms: latency.p95,
                },
            );
        }
        out
    }

    pub fn detect_basic_anomalies(&self) -> Vec<Anomaly> {
        anomaly::detect(self)
    }

    pub fn summary(&self, clock: &dyn Clock) -> ObservationSummary {
        let _ = clock;
        ObservationSummary {
            window_size_minutes: self.window_size.num_seconds() as f64 / 60.0,
            total_transactions: self.window.len(),
            overall_success_rate: self.success_rate(Dimension::Overall, ""),
            overall_latency: self.overall_latency.stats(),
            retry_efficiency: self.retry_efficiency(),
            top_errors: self.top_errors(3),
            issuer_count: self.by_issuer.len(),
            method_count: self.by_method.len(),
            anomalies: self.detect_basic_anomalies(),
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Every transaction currently retained — used by the Reasoner to scan
    /// a dimension's raw rows (e.g. region breakdown) the counters don't
    /// expose directly.
    pub fn window(&self) -> impl Iterator<Item = &Transaction> {
        self.window.iter()
    }

    pub fn payment_method_tag_count(&self, method: PaymentMethod) -> u64 {
        self.by_method
            .get(method.as_tag())
            .map(|c| c.total)
            .unwrap_or(0)
    }
}
