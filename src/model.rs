// MIT License - Copyright (c) 2026 Peter Wright

//! Typed models for the G4S cloud wire format.
//!
//! Everything the cloud sends is decoded here, once, at the client boundary.
//! In particular the vendor's string device-type tags become the closed
//! [`DeviceKind`] enum so the rest of the crate never string-matches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Alarm arm state as reported by the cloud.
///
/// `PendingArm` is the intermediate window during remote arming; the panel
/// reports it until the exit delay completes. State authority lives entirely
/// on the vendor side: we display what the last refresh said and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    Disarmed,
    NightArm,
    FullArm,
    PendingArm,
}

impl AlarmState {
    /// The vendor wire string (e.g. "FULL_ARM").
    pub fn as_vendor_str(&self) -> &'static str {
        match self {
            Self::Disarmed => "DISARMED",
            Self::NightArm => "NIGHT_ARM",
            Self::FullArm => "FULL_ARM",
            Self::PendingArm => "PENDING_ARM",
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_vendor_str())
    }
}

/// Arm mode for panel commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmMode {
    /// Full/away arm
    Away,
    /// Night/partial arm
    Night,
}

impl ArmMode {
    /// The mode string the cloud expects in the arm request body.
    pub fn as_request_str(&self) -> &'static str {
        match self {
            Self::Away => "FULL_ARM",
            Self::Night => "NIGHT_ARM",
        }
    }
}

/// Device kind, decoded from the vendor's string type tag.
///
/// Tags we have seen in the wild map to a dedicated variant; anything else is
/// preserved in `Other` rather than rejected, since the cloud grows new
/// device types without notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceKind {
    DoorWindowSensor,
    Panel,
    AccessChip,
    SmokeDetector,
    CameraDetector,
    SmartCamera,
    Siren,
    VoiceBox,
    ClimateSensor,
    WaterDetector,
    Other(String),
}

impl DeviceKind {
    /// Decode a vendor type tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "DOORWINDOWSENSOR" => Self::DoorWindowSensor,
            "PANEL" => Self::Panel,
            "ACCESSCHIP" => Self::AccessChip,
            "SMOKE2" | "SMOKE3" => Self::SmokeDetector,
            "CAMERAPIR2" | "PIR2" => Self::CameraDetector,
            "SMARTCAMERA1" => Self::SmartCamera,
            "SIREN1" => Self::Siren,
            "HOMEPAD1" | "VOICEBOX1" => Self::VoiceBox,
            "HUMIDITY1" => Self::ClimateSensor,
            "WATER1" => Self::WaterDetector,
            other => Self::Other(other.to_string()),
        }
    }

    /// The canonical vendor tag for this kind.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::DoorWindowSensor => "DOORWINDOWSENSOR",
            Self::Panel => "PANEL",
            Self::AccessChip => "ACCESSCHIP",
            Self::SmokeDetector => "SMOKE2",
            Self::CameraDetector => "PIR2",
            Self::SmartCamera => "SMARTCAMERA1",
            Self::Siren => "SIREN1",
            Self::VoiceBox => "VOICEBOX1",
            Self::ClimateSensor => "HUMIDITY1",
            Self::WaterDetector => "WATER1",
            Self::Other(tag) => tag,
        }
    }

    /// Human-readable model name, as shown to users.
    pub fn model_name(&self) -> &str {
        match self {
            Self::DoorWindowSensor => "Door Window Sensor",
            Self::Panel => "Alarm Panel",
            Self::AccessChip => "Access Chip",
            Self::SmokeDetector => "Smoke detector",
            Self::CameraDetector => "Camera detector",
            Self::SmartCamera => "SmartCam",
            Self::Siren => "Siren",
            Self::VoiceBox => "VoiceBox",
            Self::ClimateSensor => "Climate sensor",
            Self::WaterDetector => "Water detector",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for DeviceKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<DeviceKind> for String {
    fn from(kind: DeviceKind) -> Self {
        kind.as_tag().to_string()
    }
}

/// One sensor/device record from the cloud's flat device list.
///
/// `serial` is the vendor-assigned stable identifier and the primary key
/// everywhere in this crate; `name` is the user-editable display label and
/// is not unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub serial: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    #[serde(default)]
    pub battery_level: Option<u8>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub open: Option<bool>,
    #[serde(default)]
    pub access_code: Option<String>,
}

impl DeviceRecord {
    /// True when the door/window contact reports open.
    pub fn is_open(&self) -> bool {
        self.open.unwrap_or(false)
    }
}

/// A named user with a disarm authorization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    #[serde(default)]
    pub access_code: Option<String>,
}

/// One alarm installation (physical site) on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub id: String,
    pub name: String,
}

/// The full status document returned by the overview endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub state: AlarmState,
    #[serde(default)]
    pub changed_by: Option<String>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
}
