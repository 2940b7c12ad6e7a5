// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the detection engine and the runtime that hosts it.

use hids_core::FatalClassify;
use thiserror::Error;

/// Errors raised while scoring a single event or computing a baseline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("baseline input is empty")]
    EmptyBaseline,
    #[error("event is missing a numeric `metric` field")]
    NonNumericMetric,
    #[error("a fatal shutdown signal was observed during processing")]
    Shutdown,
}

impl FatalClassify for EngineError {
    // Every variant here is a validation error raised by the baseline
    // module's single call site, which always runs in strict mode (see
    // SPEC_FULL.md §4.3/§10.5), plus the dedicated shutdown signal. Unlike
    // `RuntimeError`, there is no non-fatal `EngineError` today.
    fn is_fatal(&self) -> bool {
        true
    }
}

/// Errors raised by the runtime/supervisor layer.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("runtime is already started")]
    AlreadyStarted,
    #[error("runtime is not started")]
    NotStarted,
    #[error("worker {0} exceeded its restart limit and was abandoned")]
    WorkerAbandoned(String),
    #[error("timed out waiting for runtime to stop")]
    StopTimedOut,
}

impl FatalClassify for RuntimeError {
    fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::Engine(e) if e.is_fatal())
    }
}
