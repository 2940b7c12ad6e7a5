use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    info = { "info", "LOW" },
    suspicious = { "suspicious_activity", "MEDIUM" },
    multiple = { "multiple_failures", "HIGH" },
    critical = { "critical_anomaly", "CRITICAL" },
    unknown = { "something_else", "LOW" },
)]
fn severity_table_matches_type(event_type: &str, expected: &str) {
    let event = json!({ "type": event_type, "message": "x" });
    let alert = map_event_to_alert(&event).unwrap();
    assert_eq!(alert["severity"], expected);
}

#[test]
fn missing_type_is_a_validation_error() {
    let event = json!({ "message": "x" });
    assert_eq!(
        map_event_to_alert(&event),
        Err(MappingError::MissingField("type"))
    );
}

#[test]
fn missing_message_is_a_validation_error() {
    let event = json!({ "type": "info" });
    assert_eq!(
        map_event_to_alert(&event),
        Err(MappingError::MissingField("message"))
    );
}

#[test]
fn non_mapping_input_is_a_type_error() {
    let event = json!(["not", "a", "mapping"]);
    assert_eq!(map_event_to_alert(&event), Err(MappingError::NotAMapping));
}

#[test]
fn provided_timestamp_is_preserved_verbatim() {
    let event = json!({ "type": "info", "message": "x", "timestamp": "2020-01-01T00:00:00.000Z" });
    let alert = map_event_to_alert(&event).unwrap();
    assert_eq!(alert["timestamp"], "2020-01-01T00:00:00.000Z");
}

#[test]
fn missing_timestamp_is_stamped_with_utc_now() {
    let event = json!({ "type": "info", "message": "x" });
    let alert = map_event_to_alert(&event).unwrap();
    assert!(alert["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn missing_source_defaults_to_unknown() {
    let event = json!({ "type": "info", "message": "x" });
    let alert = map_event_to_alert(&event).unwrap();
    assert_eq!(alert["source"], "unknown");
}

#[test]
fn provided_source_is_preserved() {
    let event = json!({ "type": "info", "message": "x", "source": "sshd" });
    let alert = map_event_to_alert(&event).unwrap();
    assert_eq!(alert["source"], "sshd");
}

#[test]
fn extra_keys_are_preserved() {
    let event = json!({ "type": "info", "message": "x", "src_ip": "10.0.0.5", "count": 3 });
    let alert = map_event_to_alert(&event).unwrap();
    assert_eq!(alert["src_ip"], "10.0.0.5");
    assert_eq!(alert["count"], 3);
}

#[test]
fn event_type_and_description_mirror_type_and_message() {
    let event = json!({ "type": "multiple_failures", "message": "five bad logins" });
    let alert = map_event_to_alert(&event).unwrap();
    assert_eq!(alert["event_type"], "multiple_failures");
    assert_eq!(alert["description"], "five bad logins");
}

#[test]
fn caller_supplied_severity_is_overridden_by_the_table() {
    let event = json!({ "type": "info", "message": "x", "severity": "CRITICAL" });
    let alert = map_event_to_alert(&event).unwrap();
    assert_eq!(alert["severity"], "LOW");
}
