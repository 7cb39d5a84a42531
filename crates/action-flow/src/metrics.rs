//! Process-wide run counters, by terminal status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use perceiver_structural::metrics::{make_counter, record_latency, MetricCounter};
use serde::Serialize;

use crate::types::RunResult;

static RUNS_DRY: AtomicU64 = AtomicU64::new(0);
static RUNS_SUCCESS: AtomicU64 = AtomicU64::new(0);
static RUNS_INCOMPLETE: AtomicU64 = AtomicU64::new(0);
static RUNS_FAILURE: AtomicU64 = AtomicU64::new(0);
static RUNS_REJECTED: AtomicU64 = AtomicU64::new(0);
static RUN_LAT_NS: AtomicU64 = AtomicU64::new(0);
static RUN_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunMetrics {
    pub dry_run: u64,
    pub success: u64,
    pub incomplete: u64,
    pub failure: u64,
    pub rejected: u64,
    pub latency: MetricCounter,
}

pub fn record_result(result: &RunResult, duration: Duration) {
    let counter = match result {
        RunResult::DryRun { .. } => &RUNS_DRY,
        RunResult::Success { .. } => &RUNS_SUCCESS,
        RunResult::Incomplete { .. } => &RUNS_INCOMPLETE,
        RunResult::Failure { .. } => &RUNS_FAILURE,
    };
    counter.fetch_add(1, Ordering::Relaxed);
    record_latency(&RUN_LAT_NS, &RUN_LAT_SAMPLES, duration);
}

pub fn record_rejected() {
    RUNS_REJECTED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> RunMetrics {
    let dry_run = RUNS_DRY.load(Ordering::Relaxed);
    let success = RUNS_SUCCESS.load(Ordering::Relaxed);
    let incomplete = RUNS_INCOMPLETE.load(Ordering::Relaxed);
    let failure = RUNS_FAILURE.load(Ordering::Relaxed);
    RunMetrics {
        dry_run,
        success,
        incomplete,
        failure,
        rejected: RUNS_REJECTED.load(Ordering::Relaxed),
        latency: make_counter(
            dry_run + success + incomplete + failure,
            RUN_LAT_NS.load(Ordering::Relaxed),
            RUN_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
    }
}
