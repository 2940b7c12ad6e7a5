// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutual-exclusion-protected counters and the per-event latency EWMA.

use hids_core::MetricsSnapshot;
use parking_lot::Mutex;

const EWMA_ALPHA: f64 = 0.1;

struct Counters {
    total_processed: u64,
    success_count: u64,
    failure_count: u64,
    ewma_processing_time: Option<f64>,
}

/// Shared counters updated by every worker after each processed (or
/// skipped-as-sentinel) event. Cheap enough that workers hold the lock
/// only for the duration of a single update.
pub struct WorkerMetrics {
    counters: Mutex<Counters>,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters {
                total_processed: 0,
                success_count: 0,
                failure_count: 0,
                ewma_processing_time: None,
            }),
        }
    }

    /// Record one processed event: whether it succeeded, and how long it
    /// took. The first sample seeds the EWMA directly; every subsequent
    /// sample blends in at `alpha = 0.1`.
    pub fn record(&self, success: bool, elapsed_secs: f64) {
        let mut counters = self.counters.lock();
        counters.total_processed += 1;
        if success {
            counters.success_count += 1;
        } else {
            counters.failure_count += 1;
        }
        counters.ewma_processing_time = Some(match counters.ewma_processing_time {
            None => elapsed_secs,
            Some(prev) => EWMA_ALPHA * elapsed_secs + (1.0 - EWMA_ALPHA) * prev,
        });
    }

    /// An atomic, point-in-time copy of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters.lock();
        MetricsSnapshot {
            total_processed: counters.total_processed,
            success_count: counters.success_count,
            failure_count: counters.failure_count,
            ewma_processing_time: counters.ewma_processing_time,
        }
    }
}

impl Default for WorkerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
