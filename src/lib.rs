// MIT License - Copyright (c) 2026 Peter Wright
//
//! # g4s-cloud
//!
//! Client and polling coordinator for G4S SmartAlarm installations,
//! exposing the alarm panel, door/window contacts and temperature sensors
//! behind a single periodically refreshed snapshot.
//!
//! The heavy lifting (authentication, device communication) stays on the
//! vendor cloud; this crate fetches its status document on an interval,
//! reshapes the flat device list into typed groupings, and offers a small
//! command surface (arm away/night, disarm with code validation).
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use g4s_cloud::{Coordinator, CoordinatorEvent, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionConfig::builder()
//!         .email("home@example.com")
//!         .password("secret")
//!         .installation_id("123456")
//!         .build();
//!
//!     let coordinator = Arc::new(Coordinator::new(&config)?);
//!     coordinator.first_refresh().await?;
//!
//!     let mut events = coordinator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let CoordinatorEvent::SnapshotUpdated(snapshot) = event {
//!                 println!("alarm state: {}", snapshot.alarm_state);
//!             }
//!         }
//!     });
//!
//!     coordinator.start_polling();
//!     tokio::signal::ctrl_c().await?;
//!     coordinator.shutdown();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod coordinator;
pub mod entities;
pub mod error;
pub mod event;
pub mod model;
pub mod snapshot;

// Re-exports for convenience
pub use client::G4sClient;
pub use config::{SessionConfig, SessionConfigBuilder};
pub use coordinator::Coordinator;
pub use entities::alarm_panel::AlarmPanel;
pub use entities::door_window::DoorWindowSensor;
pub use entities::thermometer::Thermometer;
pub use error::{CloudErrorCode, Error, Result};
pub use event::{CoordinatorEvent, EventReceiver};
pub use model::{AlarmState, ArmMode, DeviceKind, DeviceRecord, Installation, Overview, UserRecord};
pub use snapshot::Snapshot;
