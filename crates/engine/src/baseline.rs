// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sliding-window statistics: the process-wide global baseline series and
//! the pure functions that turn a batch of events into an anomaly
//! profile.
//!
//! The per-source baseline kept inside [`crate::engine`] reuses
//! [`threshold_from_series`] rather than duplicating the mean/stdev
//! arithmetic; the two surfaces deliberately keep independent state (see
//! SPEC_FULL.md §9) while sharing the formula.

use crate::error::EngineError;
use crate::safe_call::safe_call;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::OnceLock;

pub const BASELINE_CAPACITY: usize = 100;
const MIN_SAMPLES_FOR_STATS: usize = 10;
const DEFAULT_THRESHOLD: f64 = 5.0;
const ANOMALY_THRESHOLD_SIGMA: f64 = 3.0;

/// Result of [`build_baseline`]: first and second moments over a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineProfile {
    pub mean: f64,
    pub variance: f64,
}

/// `mean + 2*stdev` once at least `MIN_SAMPLES_FOR_STATS` samples are
/// present, else a static floor. Sample (not population) standard
/// deviation; a single-sample series is defined to have stdev `1.0` —
/// dead in practice today since the floor branch already covers any
/// series shorter than ten samples, but preserved because both the
/// global and per-source callers rely on this exact formula.
pub fn threshold_from_series(series: &VecDeque<f64>) -> f64 {
    let n = series.len();
    if n < MIN_SAMPLES_FOR_STATS {
        return DEFAULT_THRESHOLD;
    }
    let mean = series.iter().sum::<f64>() / n as f64;
    let stdev = if n > 1 {
        let variance =
            series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    } else {
        1.0
    };
    mean + 2.0 * stdev
}

/// Append `n` to `series`, dropping the oldest entry once `series` is at
/// [`BASELINE_CAPACITY`].
pub fn push_bounded(series: &mut VecDeque<f64>, n: f64) {
    if series.len() >= BASELINE_CAPACITY {
        series.pop_front();
    }
    series.push_back(n);
}

/// Compute `mean` and **population** variance over `events` whose
/// `metric` field parses as a number. Every error here is a validation
/// error and is always fatal — there is no defaulting variant, see
/// SPEC_FULL.md §4.3.
pub fn build_baseline(events: &[Value]) -> Result<BaselineProfile, EngineError> {
    if events.is_empty() {
        return Err(EngineError::EmptyBaseline);
    }
    let mut values = Vec::with_capacity(events.len());
    for event in events {
        let metric = event
            .get("metric")
            .and_then(Value::as_f64)
            .ok_or(EngineError::NonNumericMetric)?;
        values.push(metric);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(BaselineProfile { mean, variance })
}

/// Safe-call-wrapped convenience over [`build_baseline`] (§10.5's
/// "guarded/strict-mode wrapper" pair, matching the original's
/// `guarded_build_baseline`). Since every [`EngineError`] variant is
/// fatal by design (see `crate::error`), this never actually reaches its
/// own default branch — a non-fatal path simply doesn't exist for this
/// function — but it still goes through `safe_call` so a caller that
/// always wants the guarded call style gets one, and the fatal error
/// still propagates rather than being swallowed.
pub fn guarded_build_baseline(events: &[Value]) -> Result<BaselineProfile, EngineError> {
    safe_call(
        "build_baseline",
        &format!("{} events", events.len()),
        BaselineProfile {
            mean: 0.0,
            variance: 0.0,
        },
        || build_baseline(events),
    )
}

/// `true` iff `metric` is more than `3*sqrt(variance)` from `profile.mean`.
/// When `variance == 0`, any value other than the mean is anomalous.
pub fn evaluate_anomaly(metric: f64, profile: &BaselineProfile) -> bool {
    if profile.variance == 0.0 {
        return metric != profile.mean;
    }
    (metric - profile.mean).abs() > ANOMALY_THRESHOLD_SIGMA * profile.variance.sqrt()
}

/// Build a baseline from `events` and evaluate `metric` against it in
/// one call — the fallible ("strict mode") style.
pub fn try_evaluate_anomaly(metric: f64, events: &[Value]) -> Result<bool, EngineError> {
    let profile = build_baseline(events)?;
    Ok(evaluate_anomaly(metric, &profile))
}

/// Safe-call-wrapped counterpart of [`try_evaluate_anomaly`] (matching
/// the original's `guarded_evaluate_anomaly`): defaults to `false` on a
/// non-fatal error, re-raises a fatal one. See
/// [`guarded_build_baseline`] for why the default branch is unreachable
/// in practice today.
pub fn guarded_evaluate_anomaly(metric: f64, events: &[Value]) -> Result<bool, EngineError> {
    safe_call(
        "evaluate_anomaly",
        &format!("metric={metric}, {} events", events.len()),
        false,
        || try_evaluate_anomaly(metric, events),
    )
}

/// Process-wide global baseline series, used by the free-standing
/// `update_baseline`/`get_baseline_threshold` entry points named in
/// SPEC_FULL.md §4.3. Modeled as a once-initialized singleton per the
/// "global singletons" design note; [`GlobalBaseline::reset`] lets tests
/// clear it between cases without recreating the process.
pub struct GlobalBaseline {
    series: Mutex<VecDeque<f64>>,
}

impl GlobalBaseline {
    fn new() -> Self {
        Self {
            series: Mutex::new(VecDeque::with_capacity(BASELINE_CAPACITY)),
        }
    }

    pub fn update(&self, failed_count: f64) {
        push_bounded(&mut self.series.lock(), failed_count);
    }

    pub fn threshold(&self) -> f64 {
        threshold_from_series(&self.series.lock())
    }

    pub fn reset(&self) {
        self.series.lock().clear();
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.series.lock().iter().copied().collect()
    }
}

static GLOBAL_BASELINE: OnceLock<GlobalBaseline> = OnceLock::new();

fn global_baseline() -> &'static GlobalBaseline {
    GLOBAL_BASELINE.get_or_init(GlobalBaseline::new)
}

/// Append `failed_count` to the global baseline series.
pub fn update_baseline(failed_count: f64) {
    global_baseline().update(failed_count);
}

/// Current threshold of the global baseline series.
pub fn get_baseline_threshold() -> f64 {
    global_baseline().threshold()
}

/// Clear the global baseline series. Test-only: production code never
/// needs to forget history mid-process.
#[cfg(any(test, feature = "test-support"))]
pub fn reset_global_baseline() {
    global_baseline().reset();
}

#[cfg(test)]
#[path = "baseline_tests.rs"]
mod tests;
