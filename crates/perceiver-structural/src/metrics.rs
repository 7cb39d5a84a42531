//! Process-wide counters for the structural stages.
//!
//! Plain atomics so the CLI can report totals without a metrics backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

static FILTER_TOTAL: AtomicU64 = AtomicU64::new(0);
static FILTER_NODES_IN: AtomicU64 = AtomicU64::new(0);
static FILTER_NODES_KEPT: AtomicU64 = AtomicU64::new(0);
static FILTER_LAT_NS: AtomicU64 = AtomicU64::new(0);
static FILTER_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static CHUNKS_TOTAL: AtomicU64 = AtomicU64::new(0);
static BATCHES_TOTAL: AtomicU64 = AtomicU64::new(0);
static BATCHES_OVERSIZED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricCounter {
    pub total: u64,
    pub avg_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StructuralMetrics {
    pub filter: MetricCounter,
    pub nodes_in: u64,
    pub nodes_kept: u64,
    pub chunks: u64,
    pub batches: u64,
    pub oversized_batches: u64,
}

pub fn record_filter(nodes_in: usize, nodes_kept: usize, duration: Duration) {
    FILTER_TOTAL.fetch_add(1, Ordering::Relaxed);
    FILTER_NODES_IN.fetch_add(nodes_in as u64, Ordering::Relaxed);
    FILTER_NODES_KEPT.fetch_add(nodes_kept as u64, Ordering::Relaxed);
    record_latency(&FILTER_LAT_NS, &FILTER_LAT_SAMPLES, duration);
}

pub fn record_chunks(count: usize) {
    CHUNKS_TOTAL.fetch_add(count as u64, Ordering::Relaxed);
}

pub fn record_batches(count: usize, oversized: usize) {
    BATCHES_TOTAL.fetch_add(count as u64, Ordering::Relaxed);
    BATCHES_OVERSIZED.fetch_add(oversized as u64, Ordering::Relaxed);
}

pub fn snapshot() -> StructuralMetrics {
    StructuralMetrics {
        filter: make_counter(
            FILTER_TOTAL.load(Ordering::Relaxed),
            FILTER_LAT_NS.load(Ordering::Relaxed),
            FILTER_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        nodes_in: FILTER_NODES_IN.load(Ordering::Relaxed),
        nodes_kept: FILTER_NODES_KEPT.load(Ordering::Relaxed),
        chunks: CHUNKS_TOTAL.load(Ordering::Relaxed),
        batches: BATCHES_TOTAL.load(Ordering::Relaxed),
        oversized_batches: BATCHES_OVERSIZED.load(Ordering::Relaxed),
    }
}

pub fn make_counter(total: u64, nanos: u64, samples: u64) -> MetricCounter {
    let avg_ms = if samples == 0 {
        0.0
    } else {
        (nanos as f64 / samples as f64) / 1_000_000.0
    };
    MetricCounter { total, avg_ms }
}

pub fn record_latency(total_ns: &AtomicU64, samples: &AtomicU64, duration: Duration) {
    let nanos = duration_to_nanos(duration);
    total_ns.fetch_add(nanos, Ordering::Relaxed);
    samples.fetch_add(1, Ordering::Relaxed);
}

fn duration_to_nanos(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos as u64
    }
}
