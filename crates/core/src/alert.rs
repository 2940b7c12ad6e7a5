// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The alert record shape and its `ts | event_type | severity | message |
//! metadata` textual form.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Alert severity. Comparisons against free-form input are case-insensitive;
/// an unrecognized string coerces to [`Severity::Warning`] rather than
/// failing, since the alert path must never itself become a source of
/// fatal errors (see the cyclic-risk design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "INFO" => Severity::Info,
            "ERROR" => Severity::Error,
            "CRITICAL" => Severity::Critical,
            _ => Severity::Warning,
        })
    }
}

/// One emitted alert. `metadata` is serialized inline as JSON in the
/// textual form; `None` renders as an empty trailing field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    /// ISO-8601 with millisecond precision, UTC, trailing `Z`.
    pub timestamp: String,
    pub event_type: String,
    pub severity: Severity,
    /// May include an appended stack-trace block separated by `\n`.
    pub message: String,
    pub metadata: Option<Value>,
}

impl AlertRecord {
    pub fn new(
        event_type: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        metadata: Option<Value>,
    ) -> Self {
        Self {
            timestamp: now_iso_ms(),
            event_type: event_type.into(),
            severity,
            message: message.into(),
            metadata,
        }
    }

    /// Render the `ts | event_type | severity | message | metadata` line.
    pub fn to_line(&self) -> String {
        let metadata = self
            .metadata
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!(
            "{} | {} | {} | {} | {}",
            self.timestamp, self.event_type, self.severity, self.message, metadata
        )
    }

    /// Parse a previously-rendered line back into its five fields.
    /// Returns `None` if the line does not have at least 5 ` | `-separated
    /// fields (message itself may legally contain embedded `\n` but not
    /// the literal separator ` | `, which `to_line` never emits inside a
    /// message).
    pub fn parse_line(line: &str) -> Option<(String, String, Severity, String, Option<Value>)> {
        let parts: Vec<&str> = line.splitn(5, " | ").collect();
        if parts.len() != 5 {
            return None;
        }
        let severity: Severity = parts[2].parse().ok()?;
        let metadata = if parts[4].is_empty() {
            None
        } else {
            serde_json::from_str(parts[4]).ok()
        };
        Some((
            parts[0].to_string(),
            parts[1].to_string(),
            severity,
            parts[3].to_string(),
            metadata,
        ))
    }
}

fn now_iso_ms() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
#[path = "alert_tests.rs"]
mod tests;
