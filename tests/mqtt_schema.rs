// Schema validation tests for the MQTT wire format
//
// These tests construct JSON values directly (independent of Rust structs)
// and validate them against the JSON Schema files in schemas/mqtt/.

use serde_json::json;

fn load_schema(name: &str) -> serde_json::Value {
    let path = format!("{}/schemas/mqtt/{name}", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read schema {path}: {e}"));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("Failed to parse schema {path}: {e}"))
}

fn build_validator(schema_name: &str) -> jsonschema::Validator {
    let schema = load_schema(schema_name);
    jsonschema::options()
        .with_retriever(LocalRetriever)
        .build(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile schema {schema_name}: {e}"))
}

fn validate(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    let errors: Vec<_> = validator.iter_errors(instance).collect();
    if !errors.is_empty() {
        let msgs: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
        panic!(
            "Schema validation failed for {schema_name}:\n{}\nInstance: {}",
            msgs.join("\n"),
            serde_json::to_string_pretty(instance).unwrap()
        );
    }
}

fn validate_fails(schema_name: &str, instance: &serde_json::Value) {
    let validator = build_validator(schema_name);
    assert!(
        !validator.is_valid(instance),
        "Expected schema validation to fail for {schema_name}, but it passed.\nInstance: {}",
        serde_json::to_string_pretty(instance).unwrap()
    );
}

// Retriever that loads $ref schemas from the local filesystem
struct LocalRetriever;

impl jsonschema::Retrieve for LocalRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let schema_dir = format!("{}/schemas/mqtt/", env!("CARGO_MANIFEST_DIR"));

        // Extract the schema filename from various URI forms:
        // - "json-schema:///alarm_state.schema.json"
        // - "file:///path/to/alarm_state.schema.json"
        // - "alarm_state.schema.json"
        let filename = if let Some(rest) = uri_str.strip_prefix("json-schema:///") {
            rest
        } else if let Some(path) = uri_str.strip_prefix("file://") {
            // For file:// URIs, use the path directly
            let text = std::fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&text)?);
        } else {
            uri_str
        };

        let path = format!("{schema_dir}{filename}");
        if std::path::Path::new(&path).exists() {
            let text = std::fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&text)?);
        }
        Err(format!("Cannot retrieve schema: {uri_str}").into())
    }
}

// =========================================================================
// Snapshot
// =========================================================================

#[test]
fn snapshot_valid() {
    validate(
        "snapshot.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "SNAPSHOT",
            "state": {
                "alarm": {
                    "state": "armed_away",
                    "changedBy": "Alice",
                    "batteryLevel": 92
                },
                "doorWindow": [{
                    "serial": "DW-0001",
                    "name": "Front Door",
                    "open": false,
                    "batteryLevel": 70
                }],
                "climate": [{
                    "serial": "TH-0001",
                    "name": "Bedroom",
                    "celsius": 19.5,
                    "model": "Climate sensor"
                }]
            }
        }),
    );
}

#[test]
fn snapshot_empty_device_lists() {
    validate(
        "snapshot.schema.json",
        &json!({
            "now": 0,
            "op": "SNAPSHOT",
            "state": {
                "alarm": { "state": "disarmed" },
                "doorWindow": [],
                "climate": []
            }
        }),
    );
}

#[test]
fn snapshot_wrong_op() {
    validate_fails(
        "snapshot.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "WRONG",
            "state": {
                "alarm": { "state": "disarmed" },
                "doorWindow": [],
                "climate": []
            }
        }),
    );
}

#[test]
fn snapshot_missing_state() {
    validate_fails(
        "snapshot.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "SNAPSHOT"
        }),
    );
}

#[test]
fn snapshot_timestamp_string_rejected() {
    validate_fails(
        "snapshot.schema.json",
        &json!({
            "now": "2026-01-01T00:00:00Z",
            "op": "SNAPSHOT",
            "state": {
                "alarm": { "state": "disarmed" },
                "doorWindow": [],
                "climate": []
            }
        }),
    );
}

#[test]
fn snapshot_now_as_float_rejected() {
    // JSON Schema "integer" — some validators allow floats; our schemas should reject
    validate_fails(
        "snapshot.schema.json",
        &json!({
            "now": 1775000000000.5,
            "op": "SNAPSHOT",
            "state": {
                "alarm": { "state": "disarmed" },
                "doorWindow": [],
                "climate": []
            }
        }),
    );
}

// =========================================================================
// Alarm state
// =========================================================================

#[test]
fn alarm_state_all_display_values() {
    for state in ["disarmed", "armed_night", "armed_away", "pending"] {
        validate("alarm_state.schema.json", &json!({ "state": state }));
    }
}

#[test]
fn alarm_state_vendor_value_rejected() {
    // Raw vendor strings must never leak onto the wire
    validate_fails("alarm_state.schema.json", &json!({ "state": "FULL_ARM" }));
    validate_fails("alarm_state.schema.json", &json!({ "state": "PENDING_ARM" }));
}

#[test]
fn alarm_state_battery_out_of_range_rejected() {
    validate_fails(
        "alarm_state.schema.json",
        &json!({ "state": "disarmed", "batteryLevel": 101 }),
    );
}

// =========================================================================
// Door/window state
// =========================================================================

#[test]
fn door_window_state_valid() {
    validate(
        "door_window_state.schema.json",
        &json!({
            "serial": "DW-0001",
            "name": "Front Door",
            "open": true
        }),
    );
}

#[test]
fn door_window_state_missing_open_rejected() {
    validate_fails(
        "door_window_state.schema.json",
        &json!({ "serial": "DW-0001", "name": "Front Door" }),
    );
}

#[test]
fn door_window_state_name_keying_rejected() {
    // Old name-keyed payload shape (no serial) must fail
    validate_fails(
        "door_window_state.schema.json",
        &json!({ "name": "Front Door", "open": true }),
    );
}

#[test]
fn door_window_state_open_as_string_rejected() {
    validate_fails(
        "door_window_state.schema.json",
        &json!({ "serial": "DW-0001", "name": "Front Door", "open": "yes" }),
    );
}

// =========================================================================
// Temperature state
// =========================================================================

#[test]
fn temperature_state_valid() {
    validate(
        "temperature_state.schema.json",
        &json!({
            "serial": "TH-0001",
            "name": "Bedroom",
            "celsius": -3.5,
            "model": "Smoke detector",
            "batteryLevel": 55
        }),
    );
}

#[test]
fn temperature_state_missing_reading_rejected() {
    // An unavailable thermometer is omitted from the snapshot entirely,
    // never published without its reading
    validate_fails(
        "temperature_state.schema.json",
        &json!({ "serial": "TH-0001", "name": "Bedroom", "model": "Climate sensor" }),
    );
}

// =========================================================================
// Alarm events
// =========================================================================

#[test]
fn alarm_event_valid() {
    validate(
        "alarm_event.schema.json",
        &json!({ "now": 1775000000000_u64, "op": "ALARM_STATE", "state": "pending" }),
    );
}

#[test]
fn alarm_event_unknown_state_rejected() {
    validate_fails(
        "alarm_event.schema.json",
        &json!({ "now": 1775000000000_u64, "op": "ALARM_STATE", "state": "triggered" }),
    );
}

// =========================================================================
// Door events
// =========================================================================

#[test]
fn door_event_open() {
    validate(
        "door_event.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "DOOR_OPEN",
            "serial": "DW-0001",
            "name": "Front Door"
        }),
    );
}

#[test]
fn door_event_close() {
    validate(
        "door_event.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "DOOR_CLOSE",
            "serial": "DW-0002",
            "name": "Kitchen Window"
        }),
    );
}

#[test]
fn door_event_unknown_op_rejected() {
    validate_fails(
        "door_event.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "DOOR_AJAR",
            "serial": "DW-0001",
            "name": "Front Door"
        }),
    );
}

#[test]
fn door_event_missing_serial_rejected() {
    validate_fails(
        "door_event.schema.json",
        &json!({ "now": 1775000000000_u64, "op": "DOOR_OPEN", "name": "Front Door" }),
    );
}

// =========================================================================
// Device lost
// =========================================================================

#[test]
fn device_lost_valid() {
    validate(
        "device_lost.schema.json",
        &json!({ "now": 1775000000000_u64, "op": "DEVICE_LOST", "serial": "DW-0001" }),
    );
}

#[test]
fn device_lost_extra_field_rejected() {
    validate_fails(
        "device_lost.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "DEVICE_LOST",
            "serial": "DW-0001",
            "name": "Front Door"
        }),
    );
}

// =========================================================================
// Simple events
// =========================================================================

#[test]
fn refresh_failed_event_valid() {
    validate(
        "simple_event.schema.json",
        &json!({ "now": 1775000000000_u64, "op": "REFRESH_FAILED" }),
    );
}

#[test]
fn simple_event_unknown_op_rejected() {
    validate_fails(
        "simple_event.schema.json",
        &json!({ "now": 1775000000000_u64, "op": "COFFEE_READY" }),
    );
}

// =========================================================================
// CMD_ACK
// =========================================================================

#[test]
fn cmd_ack_success() {
    validate(
        "command_ack.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "CMD_ACK",
            "success": true
        }),
    );
}

#[test]
fn cmd_ack_failure_with_error() {
    validate(
        "command_ack.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "CMD_ACK",
            "success": false,
            "error": "Disarm rejected: code does not match any user or access chip"
        }),
    );
}

#[test]
fn cmd_ack_with_src_and_data() {
    validate(
        "command_ack.schema.json",
        &json!({
            "now": 1775000000000_u64,
            "op": "CMD_ACK",
            "success": true,
            "src": { "op": "SNAPSHOT" },
            "data": {
                "now": 1775000000000_u64,
                "op": "SNAPSHOT",
                "state": {
                    "alarm": { "state": "disarmed" },
                    "doorWindow": [],
                    "climate": []
                }
            }
        }),
    );
}

#[test]
fn cmd_ack_wrong_op_rejected() {
    validate_fails(
        "command_ack.schema.json",
        &json!({ "now": 1775000000000_u64, "op": "PONG", "success": true }),
    );
}

#[test]
fn cmd_ack_missing_success_rejected() {
    validate_fails(
        "command_ack.schema.json",
        &json!({ "now": 1775000000000_u64, "op": "CMD_ACK" }),
    );
}

// =========================================================================
// Inbound commands
// =========================================================================

#[test]
fn command_snapshot() {
    validate("command.schema.json", &json!({ "op": "SNAPSHOT" }));
}

#[test]
fn command_ping_with_op_id() {
    validate("command.schema.json", &json!({ "op": "PING", "op_id": "abc-123" }));
}

#[test]
fn command_arm_away() {
    validate("command.schema.json", &json!({ "op": "ARM_AWAY" }));
}

#[test]
fn command_arm_night() {
    validate("command.schema.json", &json!({ "op": "ARM_NIGHT" }));
}

#[test]
fn command_disarm_with_code() {
    validate("command.schema.json", &json!({ "op": "DISARM", "code": "1234" }));
}

#[test]
fn command_unknown_op_rejected() {
    validate_fails("command.schema.json", &json!({ "op": "EXPLODE" }));
}

#[test]
fn command_missing_op_rejected() {
    validate_fails("command.schema.json", &json!({ "code": "1234" }));
}

#[test]
fn command_code_as_number_rejected() {
    validate_fails("command.schema.json", &json!({ "op": "DISARM", "code": 1234 }));
}

#[test]
fn command_extra_field_rejected() {
    validate_fails("command.schema.json", &json!({ "op": "PING", "extra": true }));
}
