// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The concurrent detection runtime: event channel, worker pool,
//! supervisor, detection engine, baselines, and metrics.
//!
//! `hids-core` owns the vocabulary (`SrcId`, `Clock`, `AlertRecord`); this
//! crate owns everything that moves — the scoring state machine and the
//! concurrency that drives it. `hids-adapters` supplies the concrete
//! `AlertSink` and the log tailer that feeds [`channel::EventChannel`];
//! neither is a dependency of this crate (see `engine::AlertSink`).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod baseline;
pub mod channel;
pub mod engine;
pub mod error;
pub mod heartbeat;
pub mod metrics;
pub mod runtime;
pub mod safe_call;
pub mod worker;

pub use baseline::{
    build_baseline, evaluate_anomaly, get_baseline_threshold, guarded_build_baseline,
    guarded_evaluate_anomaly, try_evaluate_anomaly, update_baseline, BaselineProfile,
};
pub use channel::{BackpressurePolicy, EventChannel};
pub use engine::{AlertSink, DetectionEngine, Engine};
pub use error::{EngineError, RuntimeError};
pub use heartbeat::HeartbeatTable;
pub use metrics::WorkerMetrics;
pub use runtime::{HealthStatus, Runtime, RuntimeManager};
pub use safe_call::safe_call;
pub use worker::Worker;

#[cfg(any(test, feature = "test-support"))]
pub use baseline::reset_global_baseline;
