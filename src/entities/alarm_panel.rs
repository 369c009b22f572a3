// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::Arc;

use serde::Serialize;

use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::model::AlarmState;
use crate::snapshot::Snapshot;

/// Display vocabulary for the alarm panel entity.
///
/// State authority lives in the vendor service; this maps whatever the last
/// snapshot reported, with no client-side transition validation. The
/// intermediate `PENDING_ARM` window during remote arming displays as
/// "pending" (arming in progress), neither armed nor disarmed.
pub fn display_state(state: AlarmState) -> &'static str {
    match state {
        AlarmState::Disarmed => "disarmed",
        AlarmState::NightArm => "armed_night",
        AlarmState::FullArm => "armed_away",
        AlarmState::PendingArm => "pending",
    }
}

/// Published state of the alarm panel entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmPanelState {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
}

/// Pure projection of a snapshot onto the panel entity.
pub fn project(snapshot: &Snapshot) -> AlarmPanelState {
    AlarmPanelState {
        state: display_state(snapshot.alarm_state),
        changed_by: snapshot.changed_by.clone(),
        battery_level: snapshot.panel_battery_level(),
    }
}

/// The alarm control panel entity: one per installation.
pub struct AlarmPanel {
    coordinator: Arc<Coordinator>,
}

impl AlarmPanel {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Current display state, or `None` before the first refresh.
    pub async fn state(&self) -> Option<AlarmPanelState> {
        self.coordinator.snapshot().await.map(|s| project(&s))
    }

    /// Arm away. No code required; the follow-up refresh converges on
    /// whatever state the vendor reports.
    pub async fn arm_away(&self) -> Result<()> {
        self.coordinator.arm_away().await
    }

    /// Arm night. No code required.
    pub async fn arm_night(&self) -> Result<()> {
        self.coordinator.arm_night().await
    }

    /// Disarm with a code; rejected explicitly when the code matches no user
    /// or access chip.
    pub async fn disarm(&self, code: Option<&str>) -> Result<()> {
        self.coordinator.disarm(code).await
    }
}
