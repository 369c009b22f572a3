// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::Arc;

use serde::Serialize;

use crate::coordinator::Coordinator;
use crate::snapshot::Snapshot;

/// Published state of one door/window contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorWindowState {
    pub serial: String,
    pub name: String,
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
}

/// Pure projection of a snapshot onto one contact.
///
/// `None` means the serial is gone from the current snapshot (device removed
/// upstream): the entity is unavailable, keeping its last-known value at the
/// consumer's discretion.
pub fn project(snapshot: &Snapshot, serial: &str) -> Option<DoorWindowState> {
    let device = snapshot.door_window.get(serial)?;
    Some(DoorWindowState {
        serial: device.serial.clone(),
        name: device.name.clone(),
        open: device.is_open(),
        battery_level: device.battery_level,
    })
}

/// One door/window sensor entity, identified by its vendor serial.
pub struct DoorWindowSensor {
    coordinator: Arc<Coordinator>,
    serial: String,
}

impl DoorWindowSensor {
    pub fn new(coordinator: Arc<Coordinator>, serial: impl Into<String>) -> Self {
        Self {
            coordinator,
            serial: serial.into(),
        }
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Current state, or `None` when unavailable.
    pub async fn state(&self) -> Option<DoorWindowState> {
        let snapshot = self.coordinator.snapshot().await?;
        project(&snapshot, &self.serial)
    }

    pub async fn is_available(&self) -> bool {
        self.state().await.is_some()
    }
}
