// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-fatal error barrier: invoke a step once, log and default on
//! recoverable failure, re-propagate anything fatal.
//!
//! This is the seam that stops one malformed event from tearing down a
//! worker. It never logs through the alert subsystem — only through
//! `tracing` — so the engine-worker-safe_call-alert path named in the
//! cyclic-risk design note can't loop back on itself.

use hids_core::FatalClassify;
use std::fmt;

const ARG_SUMMARY_LIMIT: usize = 200;

/// Invoke `f` exactly once. On success, return its value. On a non-fatal
/// error, log it (function name, truncated argument summary, error) and
/// return `default`. On a fatal error, re-propagate.
pub fn safe_call<T, E, F>(function: &str, arg_summary: &str, default: T, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: FatalClassify + fmt::Display,
{
    match f() {
        Ok(value) => Ok(value),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            tracing::warn!(
                target: "runtime",
                function,
                args = %truncate(arg_summary, ARG_SUMMARY_LIMIT),
                error = %err,
                "recovered from non-fatal error",
            );
            Ok(default)
        }
    }
}

fn truncate(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(limit).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
#[path = "safe_call_tests.rs"]
mod tests;
