// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable metrics snapshot DTO. The mutable counters and EWMA
//! computation that produce it live in `hids-engine::metrics`; this crate
//! only owns the shape so `hids-daemon` and `hids-adapters` can read it
//! without depending on `hids-engine`.

use serde::{Deserialize, Serialize};

/// A point-in-time copy of the shared counters. `ewma_processing_time` is
/// `None` until the first sample has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_processed: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub ewma_processing_time: Option<f64>,
}

impl MetricsSnapshot {
    pub fn zero() -> Self {
        Self {
            total_processed: 0,
            success_count: 0,
            failure_count: 0,
            ewma_processing_time: None,
        }
    }

    /// `success / total`, or `0.0` when nothing has been processed yet.
    pub fn worker_efficiency(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_processed as f64
        }
    }

    /// `1 / ewma`, or `0.0` when the EWMA is unseeded or zero.
    pub fn recent_throughput_eps(&self) -> f64 {
        match self.ewma_processing_time {
            Some(ewma) if ewma > 0.0 => 1.0 / ewma,
            _ => 0.0,
        }
    }

    /// `failure / total`, or `0.0` when nothing has been processed yet.
    pub fn failure_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            self.failure_count as f64 / self.total_processed as f64
        }
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::zero()
    }
}
