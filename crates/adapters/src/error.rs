// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the alert sink, log tailer, and event-to-alert mapping.

use hids_core::FatalClassify;
use thiserror::Error;

/// Errors raised by the structured alert sink (§4.2).
#[derive(Debug, Error)]
pub enum AlertSinkError {
    #[error("failed to open alert log file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write alert record: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to rotate alert log: {0}")]
    Rotate(#[source] std::io::Error),
}

impl FatalClassify for AlertSinkError {
    // A write hiccup on the sink is the textbook "transient runtime"
    // error named in SPEC_FULL.md §7: logged and recovered from by the
    // safe-call wrapper, never torn down over.
    fn is_fatal(&self) -> bool {
        false
    }
}

/// Errors raised by the log tailer and `collect_events` helper (§4.6).
#[derive(Debug, Error)]
pub enum TailerError {
    #[error("failed to open tailed file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read tailed file: {0}")]
    Read(#[source] std::io::Error),
}

impl FatalClassify for TailerError {
    fn is_fatal(&self) -> bool {
        false
    }
}

/// Errors raised by the event-to-alert mapping (§6).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("input is not a mapping")]
    NotAMapping,
}

impl FatalClassify for MappingError {
    // Validation errors are surfaced to the caller, never swallowed by
    // the internal pipeline (SPEC_FULL.md §7) — the mapping has no
    // internal pipeline to swallow them in the first place, but the
    // classification is still correct: a caller that routes this
    // through the safe-call wrapper should see it propagate.
    fn is_fatal(&self) -> bool {
        true
    }
}
