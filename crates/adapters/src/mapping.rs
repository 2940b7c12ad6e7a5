// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event-to-alert mapping (§6, §9): a pure function from a loosely
//! shaped inbound event to the fields an alert record needs. Kept
//! explicit rather than duck-typed per the design note in §9 — required
//! keys are checked up front, not inferred from whatever happens to be
//! present.
//!
//! The `type` vocabulary here (`info`, `suspicious_activity`, ...) is
//! deliberately distinct from the `event_type` vocabulary `send_alert`
//! uses (`SECURITY`, `NETWORK`, `SYSTEM`); §9 flags this as intentional
//! and the two are not unified.

use crate::error::MappingError;
use chrono::Utc;
use serde_json::{Map, Value};

const RESERVED_KEYS: [&str; 7] = [
    "type",
    "message",
    "timestamp",
    "source",
    "severity",
    "description",
    "event_type",
];

fn severity_for(event_type: &str) -> &'static str {
    match event_type {
        "info" => "LOW",
        "suspicious_activity" => "MEDIUM",
        "multiple_failures" => "HIGH",
        "critical_anomaly" => "CRITICAL",
        _ => "LOW",
    }
}

/// Validate and enrich an inbound event into an alert-ready JSON object.
///
/// Required: `type` (string), `message` (string). Optional: `timestamp`
/// (preserved verbatim if present, else stamped with current UTC),
/// `source` (defaults to `"unknown"`). `event_type` and `description`
/// are added as copies of `type`/`message` per §6's fuller key list;
/// every other key in `event` is carried through unchanged.
///
/// This is a plain, explicit function rather than a safe-call-wrapped
/// one: every failure mode it has is a named validation error, so there
/// is no "unexpected internal failure" path distinct from the two
/// already returned.
pub fn map_event_to_alert(event: &Value) -> Result<Map<String, Value>, MappingError> {
    let object = event.as_object().ok_or(MappingError::NotAMapping)?;

    let event_type = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(MappingError::MissingField("type"))?;
    let message = object
        .get("message")
        .and_then(Value::as_str)
        .ok_or(MappingError::MissingField("message"))?;

    let timestamp = object
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());
    let source = object
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let mut out = Map::new();
    out.insert("type".to_string(), Value::String(event_type.to_string()));
    out.insert("message".to_string(), Value::String(message.to_string()));
    out.insert(
        "event_type".to_string(),
        Value::String(event_type.to_string()),
    );
    out.insert(
        "description".to_string(),
        Value::String(message.to_string()),
    );
    out.insert(
        "severity".to_string(),
        Value::String(severity_for(event_type).to_string()),
    );
    out.insert("timestamp".to_string(), Value::String(timestamp));
    out.insert("source".to_string(), Value::String(source));

    for (key, value) in object {
        if !RESERVED_KEYS.contains(&key.as_str()) {
            out.insert(key.clone(), value.clone());
        }
    }

    Ok(out)
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
