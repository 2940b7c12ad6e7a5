// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One detection worker: dequeue, score through the safe-call wrapper,
//! update metrics and heartbeat, report periodically.

use crate::channel::EventChannel;
use crate::engine::DetectionEngine;
use crate::error::EngineError;
use crate::heartbeat::HeartbeatTable;
use crate::metrics::WorkerMetrics;
use crate::safe_call::safe_call;
use hids_core::{FatalClassify, WorkerId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);
const REPORT_INTERVAL: Duration = Duration::from_secs(60);
const BACKPRESSURE_CHECK_INTERVAL: Duration = Duration::from_secs(10);

pub struct Worker {
    pub id: WorkerId,
    channel: Arc<EventChannel>,
    engine: Arc<dyn DetectionEngine>,
    metrics: Arc<WorkerMetrics>,
    heartbeats: Arc<HeartbeatTable>,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        channel: Arc<EventChannel>,
        engine: Arc<dyn DetectionEngine>,
        metrics: Arc<WorkerMetrics>,
        heartbeats: Arc<HeartbeatTable>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            channel,
            engine,
            metrics,
            heartbeats,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!(target: "runtime", worker_id = %self.id, "detection worker started");

        let mut last_report = Instant::now();
        let mut last_backpressure_check = Instant::now();
        let mut backpressure_warning_active = false;

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.channel.recv_timeout(DEQUEUE_TIMEOUT).await {
                None => {}
                Some(src) => {
                    if src.as_str().is_empty() {
                        tracing::warn!(target: "runtime", worker_id = %self.id, "skipping empty sentinel event");
                    } else {
                        let t0 = Instant::now();
                        let result: Result<(), EngineError> = safe_call(
                            "process_failed_login",
                            src.as_str(),
                            (),
                            || self.engine.process_failed_login(&src),
                        );
                        let success = result.is_ok();
                        if let Err(err) = &result {
                            if err.is_fatal() {
                                tracing::error!(target: "runtime", worker_id = %self.id, error = %err, "fatal error observed, raising shutdown");
                                self.shutdown.store(true, Ordering::Relaxed);
                                break;
                            }
                        }
                        let elapsed = t0.elapsed().as_secs_f64();
                        self.metrics.record(success, elapsed);
                        self.heartbeats.touch(&self.id);
                    }
                }
            }

            let now = Instant::now();

            if now.duration_since(last_report) >= REPORT_INTERVAL {
                let snapshot = self.metrics.snapshot();
                tracing::info!(
                    target: "runtime",
                    worker_id = %self.id,
                    total_processed = snapshot.total_processed,
                    success_count = snapshot.success_count,
                    failure_count = snapshot.failure_count,
                    ewma_processing_time = snapshot.ewma_processing_time.unwrap_or(0.0),
                    "periodic worker summary",
                );
                last_report = now;
            }

            if now.duration_since(last_backpressure_check) >= BACKPRESSURE_CHECK_INTERVAL {
                let qsize = self.channel.qsize();
                if qsize > crate::channel::BACKPRESSURE_THRESHOLD {
                    if !backpressure_warning_active {
                        tracing::warn!(target: "runtime", worker_id = %self.id, qsize, "backpressure detected");
                        backpressure_warning_active = true;
                    }
                } else if backpressure_warning_active {
                    tracing::info!(target: "runtime", worker_id = %self.id, qsize, "backpressure resolved");
                    backpressure_warning_active = false;
                }
                last_backpressure_check = now;
            }
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            target: "runtime",
            worker_id = %self.id,
            total_processed = snapshot.total_processed,
            success_count = snapshot.success_count,
            failure_count = snapshot.failure_count,
            "detection worker stopped",
        );
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
