// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn severity_parses_case_insensitively() {
    assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
    assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
    assert_eq!("Error".parse::<Severity>().unwrap(), Severity::Error);
}

#[test]
fn unknown_severity_coerces_to_warning() {
    assert_eq!("bogus".parse::<Severity>().unwrap(), Severity::Warning);
}

#[test]
fn to_line_renders_five_pipe_separated_fields() {
    let record = AlertRecord::new(
        "SECURITY",
        Severity::Warning,
        "Burst attack detected",
        Some(json!({"count": 3})),
    );
    let line = record.to_line();
    assert_eq!(line.matches(" | ").count(), 4);
    assert!(line.contains("SECURITY | WARNING | Burst attack detected"));
}

#[test]
fn to_line_with_no_metadata_has_empty_trailing_field() {
    let record = AlertRecord::new("SYSTEM", Severity::Info, "hello", None);
    let line = record.to_line();
    assert!(line.ends_with(" | "));
}

#[test]
fn round_trip_preserves_all_five_fields() {
    let record = AlertRecord::new(
        "NETWORK",
        Severity::Critical,
        "High risk intrusion detected",
        Some(json!({"score": 11.5})),
    );
    let line = record.to_line();
    let (ts, event_type, severity, message, metadata) = AlertRecord::parse_line(&line).unwrap();
    assert_eq!(ts, record.timestamp);
    assert_eq!(event_type, "NETWORK");
    assert_eq!(severity, Severity::Critical);
    assert_eq!(message, "High risk intrusion detected");
    assert_eq!(metadata, Some(json!({"score": 11.5})));
}

#[test]
fn parse_line_rejects_malformed_input() {
    assert!(AlertRecord::parse_line("not enough fields").is_none());
}
