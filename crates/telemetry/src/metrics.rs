//! In-memory metrics.
//!
//! Handles are cheap to clone and share their value with the registry that
//! created them. There is no exporter: the registry is read back through
//! [`MetricsRegistry::snapshot`], which the CLI prints at shutdown.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;

/// Monotonic counter.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    /// A detached counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by one.
    pub fn inc(&self) {
        self.inc_by(1);
    }

    /// Increment by `n`.
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Value that moves both ways, e.g. running tasks.
#[derive(Debug, Clone, Default)]
pub struct Gauge {
    value: Arc<AtomicI64>,
}

impl Gauge {
    /// A detached gauge starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by one.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement by one.
    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    /// Overwrite the value.
    pub fn set(&self, v: i64) {
        self.value.store(v, Ordering::Relaxed);
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Running summary of observed values.
///
/// Only count, sum, min and max are kept, so memory stays constant no
/// matter how long a node runs.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    inner: Arc<HistogramInner>,
}

#[derive(Debug)]
struct HistogramInner {
    count: AtomicU64,
    sum: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl Default for HistogramInner {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),
        }
    }
}

impl Histogram {
    /// A detached histogram with no observations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation.
    pub fn observe(&self, value: u64) {
        let inner = &self.inner;
        inner.count.fetch_add(1, Ordering::Relaxed);
        inner.sum.fetch_add(value, Ordering::Relaxed);
        inner.min.fetch_min(value, Ordering::Relaxed);
        inner.max.fetch_max(value, Ordering::Relaxed);
    }

    /// Number of observations.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.inner.count.load(Ordering::Relaxed)
    }

    /// Point-in-time summary.
    #[must_use]
    pub fn summary(&self) -> HistogramSummary {
        let count = self.count();
        if count == 0 {
            return HistogramSummary::default();
        }
        HistogramSummary {
            count,
            sum: self.inner.sum.load(Ordering::Relaxed),
            min: self.inner.min.load(Ordering::Relaxed),
            max: self.inner.max.load(Ordering::Relaxed),
        }
    }
}

/// Summary of a [`Histogram`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistogramSummary {
    /// Number of observations.
    pub count: u64,
    /// Sum of all observations.
    pub sum: u64,
    /// Smallest observation, zero when empty.
    pub min: u64,
    /// Largest observation, zero when empty.
    pub max: u64,
}

impl HistogramSummary {
    /// Arithmetic mean, `None` when nothing was observed.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Named metric store shared by every component of one process.
///
/// Asking for the same name twice returns handles to the same value.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<RwLock<HashMap<String, Counter>>>,
    gauges: Arc<RwLock<HashMap<String, Gauge>>>,
    histograms: Arc<RwLock<HashMap<String, Histogram>>>,
}

impl MetricsRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a counter.
    pub fn counter(&self, name: &str) -> Counter {
        get_or_insert(&self.counters, name)
    }

    /// Get or create a gauge.
    pub fn gauge(&self, name: &str) -> Gauge {
        get_or_insert(&self.gauges, name)
    }

    /// Get or create a histogram.
    pub fn histogram(&self, name: &str) -> Histogram {
        get_or_insert(&self.histograms, name)
    }

    /// Read every metric at once, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self
                .counters
                .read()
                .iter()
                .map(|(name, c)| (name.clone(), c.get()))
                .collect(),
            gauges: self
                .gauges
                .read()
                .iter()
                .map(|(name, g)| (name.clone(), g.get()))
                .collect(),
            histograms: self
                .histograms
                .read()
                .iter()
                .map(|(name, h)| (name.clone(), h.summary()))
                .collect(),
        }
    }
}

fn get_or_insert<T: Clone + Default>(map: &RwLock<HashMap<String, T>>, name: &str) -> T {
    if let Some(existing) = map.read().get(name) {
        return existing.clone();
    }
    map.write().entry(name.to_owned()).or_default().clone()
}

/// Values of every registered metric, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Counter values.
    pub counters: BTreeMap<String, u64>,
    /// Gauge values.
    pub gauges: BTreeMap<String, i64>,
    /// Histogram summaries.
    pub histograms: BTreeMap<String, HistogramSummary>,
}

impl MetricsSnapshot {
    /// Counter value, zero if the counter was never created.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or_default()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty() && self.histograms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counter_increments() {
        let c = Counter::new();
        c.inc();
        c.inc_by(4);
        assert_eq!(c.get(), 5);
    }

    #[test]
    fn gauge_moves_both_ways() {
        let g = Gauge::new();
        g.inc();
        g.inc();
        g.dec();
        assert_eq!(g.get(), 1);
        g.set(-3);
        assert_eq!(g.get(), -3);
    }

    #[test]
    fn histogram_summarises() {
        let h = Histogram::new();
        assert_eq!(h.summary(), HistogramSummary::default());
        assert_eq!(h.summary().mean(), None);

        for v in [30, 10, 20] {
            h.observe(v);
        }
        let s = h.summary();
        assert_eq!(
            s,
            HistogramSummary {
                count: 3,
                sum: 60,
                min: 10,
                max: 30
            }
        );
        assert_eq!(s.mean(), Some(20.0));
    }

    #[test]
    fn registry_returns_shared_handles() {
        let registry = MetricsRegistry::new();
        registry.counter("published").inc();
        registry.counter("published").inc();
        registry.gauge("running").inc();
        registry.histogram("latency_ms").observe(7);

        let snap = registry.snapshot();
        assert_eq!(snap.counter("published"), 2);
        assert_eq!(snap.counter("never"), 0);
        assert_eq!(snap.gauges["running"], 1);
        assert_eq!(snap.histograms["latency_ms"].count, 1);
    }

    #[test]
    fn clones_share_storage() {
        let registry = MetricsRegistry::new();
        let other = registry.clone();
        other.counter("x").inc_by(3);
        assert_eq!(registry.snapshot().counter("x"), 3);
    }

    #[test]
    fn snapshot_serialises_sorted() {
        let registry = MetricsRegistry::new();
        registry.counter("b").inc();
        registry.counter("a").inc();
        let json = serde_json::to_string(&registry.snapshot().counters).unwrap();
        assert_eq!(json, r#"{"a":1,"b":1}"#);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let registry = MetricsRegistry::new();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    for _ in 0..1000 {
                        registry.counter("hits").inc();
                    }
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(registry.snapshot().counter("hits"), 8000);
    }
}
