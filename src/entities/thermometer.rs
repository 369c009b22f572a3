// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::Arc;

use serde::Serialize;

use crate::coordinator::Coordinator;
use crate::snapshot::Snapshot;

/// Published state of one temperature sensor. Readings are degrees Celsius.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureState {
    pub serial: String,
    pub name: String,
    pub celsius: f64,
    /// Human-readable model name for the underlying device kind.
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
}

/// Pure projection of a snapshot onto one thermometer.
///
/// `None` when the serial is gone from the climate grouping or its reading
/// became absent: either way the entity is unavailable.
pub fn project(snapshot: &Snapshot, serial: &str) -> Option<TemperatureState> {
    let device = snapshot.climate.get(serial)?;
    let celsius = device.temperature?;
    Some(TemperatureState {
        serial: device.serial.clone(),
        name: device.name.clone(),
        celsius,
        model: device.kind.model_name().to_string(),
        battery_level: device.battery_level,
    })
}

/// One temperature sensor entity, identified by its vendor serial.
pub struct Thermometer {
    coordinator: Arc<Coordinator>,
    serial: String,
}

impl Thermometer {
    pub fn new(coordinator: Arc<Coordinator>, serial: impl Into<String>) -> Self {
        Self {
            coordinator,
            serial: serial.into(),
        }
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Current reading, or `None` when unavailable.
    pub async fn state(&self) -> Option<TemperatureState> {
        let snapshot = self.coordinator.snapshot().await?;
        project(&snapshot, &self.serial)
    }

    pub async fn is_available(&self) -> bool {
        self.state().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlarmState, DeviceKind, DeviceRecord, Overview};

    fn sensor(serial: &str, temperature: Option<f64>) -> DeviceRecord {
        DeviceRecord {
            serial: serial.to_string(),
            name: "Bedroom".to_string(),
            kind: DeviceKind::ClimateSensor,
            battery_level: None,
            temperature,
            open: None,
            access_code: None,
        }
    }

    fn snapshot_with(devices: Vec<DeviceRecord>) -> Snapshot {
        Snapshot::from_overview(Overview {
            state: AlarmState::Disarmed,
            changed_by: None,
            users: Vec::new(),
            devices,
        })
    }

    #[test]
    fn test_project_reading() {
        let snap = snapshot_with(vec![sensor("T1", Some(19.5))]);
        let state = project(&snap, "T1").unwrap();
        assert_eq!(state.celsius, 19.5);
        assert_eq!(state.model, "Climate sensor");
    }

    #[test]
    fn test_unavailable_when_missing_or_reading_absent() {
        let snap = snapshot_with(vec![sensor("T1", Some(19.5))]);
        assert!(project(&snap, "T2").is_none());

        // A device whose reading disappeared never enters the climate
        // grouping, so the projection goes unavailable with it
        let snap = snapshot_with(vec![sensor("T1", None)]);
        assert!(project(&snap, "T1").is_none());
    }
}
