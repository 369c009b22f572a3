// MIT License - Copyright (c) 2026 Peter Wright

//! The coordinator's published view of one refresh cycle.

use std::collections::HashMap;

use crate::model::{AlarmState, DeviceKind, DeviceRecord, Overview, UserRecord};

/// Immutable result of one successful refresh.
///
/// The flat device list from the cloud is reshaped into typed groupings,
/// keyed by the vendor serial. The predicates are independent: a device lands
/// in every grouping it satisfies, so a panel that reports a temperature
/// appears in both `panel` and `climate`. Consumers must not assume the
/// groupings are mutually exclusive.
///
/// A snapshot is never mutated after publication; each refresh builds a new
/// one and atomically replaces the shared `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub alarm_state: AlarmState,
    /// Name of the user who last changed the arm state, when the cloud knows.
    pub changed_by: Option<String>,
    /// Devices with a temperature reading.
    pub climate: HashMap<String, DeviceRecord>,
    /// Door/window contacts.
    pub door_window: HashMap<String, DeviceRecord>,
    /// The alarm panel itself (normally a single entry).
    pub panel: HashMap<String, DeviceRecord>,
    /// Keyfob/token devices whose own code can authorize a disarm.
    pub access_chips: HashMap<String, DeviceRecord>,
    /// Users known to the installation, for disarm code validation.
    pub users: Vec<UserRecord>,
}

impl Snapshot {
    /// Reshape an overview document into the published groupings.
    ///
    /// Duplicate serials within a grouping resolve last-write-wins in vendor
    /// list order. Display names play no role in keying: two devices sharing
    /// a name are distinct entries as long as their serials differ.
    pub fn from_overview(overview: Overview) -> Self {
        let mut climate = HashMap::new();
        let mut door_window = HashMap::new();
        let mut panel = HashMap::new();
        let mut access_chips = HashMap::new();

        for device in overview.devices {
            if device.temperature.is_some() {
                climate.insert(device.serial.clone(), device.clone());
            }
            match device.kind {
                DeviceKind::DoorWindowSensor => {
                    door_window.insert(device.serial.clone(), device.clone());
                }
                DeviceKind::Panel => {
                    panel.insert(device.serial.clone(), device.clone());
                }
                DeviceKind::AccessChip => {
                    access_chips.insert(device.serial.clone(), device.clone());
                }
                _ => {}
            }
        }

        Self {
            alarm_state: overview.state,
            changed_by: overview.changed_by,
            climate,
            door_window,
            panel,
            access_chips,
            users: overview.users,
        }
    }

    /// Battery level of the panel device, if it reports one.
    pub fn panel_battery_level(&self) -> Option<u8> {
        self.panel.values().find_map(|d| d.battery_level)
    }

    /// True iff `code` exactly equals some user's access code or some access
    /// chip's code. Empty codes never match; no trimming or normalization is
    /// applied, so whitespace-padded near-matches are rejected.
    pub fn code_matches(&self, code: &str) -> bool {
        if code.is_empty() {
            return false;
        }
        let user_match = self
            .users
            .iter()
            .any(|u| u.access_code.as_deref() == Some(code));
        let chip_match = self
            .access_chips
            .values()
            .any(|d| d.access_code.as_deref() == Some(code));
        user_match || chip_match
    }
}
