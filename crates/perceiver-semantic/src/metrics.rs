//! Process-wide labeling counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use perceiver_structural::metrics::{make_counter, record_latency, MetricCounter};
use serde::Serialize;

static PIPELINE_RUNS: AtomicU64 = AtomicU64::new(0);
static BATCH_TOTAL: AtomicU64 = AtomicU64::new(0);
static BATCH_LAT_NS: AtomicU64 = AtomicU64::new(0);
static BATCH_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);
static ABSORBED_FAULTS: AtomicU64 = AtomicU64::new(0);
static DOWNGRADED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LabelingMetrics {
    pub runs: u64,
    pub batches: MetricCounter,
    pub absorbed_faults: u64,
    pub downgraded: u64,
}

pub fn record_run() {
    PIPELINE_RUNS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_batch(duration: Duration) {
    BATCH_TOTAL.fetch_add(1, Ordering::Relaxed);
    record_latency(&BATCH_LAT_NS, &BATCH_LAT_SAMPLES, duration);
}

pub fn record_absorbed_fault() {
    ABSORBED_FAULTS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_downgraded(count: usize) {
    DOWNGRADED.fetch_add(count as u64, Ordering::Relaxed);
}

pub fn snapshot() -> LabelingMetrics {
    LabelingMetrics {
        runs: PIPELINE_RUNS.load(Ordering::Relaxed),
        batches: make_counter(
            BATCH_TOTAL.load(Ordering::Relaxed),
            BATCH_LAT_NS.load(Ordering::Relaxed),
            BATCH_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        absorbed_faults: ABSORBED_FAULTS.load(Ordering::Relaxed),
        downgraded: DOWNGRADED.load(Ordering::Relaxed),
    }
}
