// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

mod settings;
mod setup;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use g4s_cloud::entities::alarm_panel::{self, AlarmPanelState};
use g4s_cloud::entities::door_window::{self, DoorWindowState};
use g4s_cloud::entities::thermometer::{self, TemperatureState};
use g4s_cloud::{Coordinator, CoordinatorEvent, Snapshot};

use crate::settings::{Settings, parse_mqtt_url};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "g4s2mqtt")]
#[command(about = "Bridge between the G4S SmartAlarm cloud and MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive first-time setup: log in, pick an installation, write the config
    Setup,
    /// Update stored credentials after a password change
    Reauth,
}

// ---------------------------------------------------------------------------
// MQTT JSON types
// ---------------------------------------------------------------------------

// Published messages — all share the {now, op, ...} flat structure

#[derive(Serialize)]
struct MqttSnapshot {
    now: u64,
    op: String,
    state: BridgeState,
}

#[derive(Serialize)]
struct BridgeState {
    alarm: AlarmPanelState,
    #[serde(rename = "doorWindow")]
    door_window: Vec<DoorWindowState>,
    climate: Vec<TemperatureState>,
}

// Alarm state transitions: {now, op, state}
#[derive(Serialize)]
struct MqttAlarmEvent {
    now: u64,
    op: String,
    state: &'static str,
}

// Door events: {now, op, serial, name}
#[derive(Serialize)]
struct MqttDoorEvent {
    now: u64,
    op: String,
    serial: String,
    name: String,
}

// Device disappeared from the overview: {now, op, serial}
#[derive(Serialize)]
struct MqttDeviceLost {
    now: u64,
    op: String,
    serial: String,
}

// CMD_ACK response
#[derive(Serialize)]
struct MqttCmdAck {
    now: u64,
    op: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// Simple event with just {now, op}
#[derive(Serialize)]
struct MqttSimpleEvent {
    now: u64,
    op: String,
}

// Inbound command (subscribed)
#[derive(Deserialize)]
struct MqttCommand {
    op: String,
    #[serde(default)]
    #[allow(dead_code)]
    op_id: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

async fn publish_json(client: &AsyncClient, topic: &str, payload: &impl Serialize, retain: bool) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, retain, json).await {
                error!("Failed to publish to {topic}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}

async fn publish_simple_event(client: &AsyncClient, topic: &str, op: &str) {
    let msg = MqttSimpleEvent {
        now: now_epoch_ms(),
        op: op.to_string(),
    };
    publish_json(client, topic, &msg, false).await;
}

async fn publish_cmd_ack(
    client: &AsyncClient,
    topic: &str,
    success: bool,
    src: Option<serde_json::Value>,
    data: Option<serde_json::Value>,
    error: Option<String>,
) {
    let msg = MqttCmdAck {
        now: now_epoch_ms(),
        op: "CMD_ACK".to_string(),
        success,
        src,
        data,
        error,
    };
    publish_json(client, topic, &msg, false).await;
}

/// Project the snapshot onto the published entity states.
fn build_bridge_state(snapshot: &Snapshot) -> BridgeState {
    let mut door_window: Vec<DoorWindowState> = snapshot
        .door_window
        .keys()
        .filter_map(|serial| door_window::project(snapshot, serial))
        .collect();
    door_window.sort_by(|a, b| a.serial.cmp(&b.serial));

    let mut climate: Vec<TemperatureState> = snapshot
        .climate
        .keys()
        .filter_map(|serial| thermometer::project(snapshot, serial))
        .collect();
    climate.sort_by(|a, b| a.serial.cmp(&b.serial));

    BridgeState {
        alarm: alarm_panel::project(snapshot),
        door_window,
        climate,
    }
}

fn build_snapshot_msg(snapshot: &Snapshot) -> MqttSnapshot {
    MqttSnapshot {
        now: now_epoch_ms(),
        op: "SNAPSHOT".to_string(),
        state: build_bridge_state(snapshot),
    }
}

async fn publish_snapshot(client: &AsyncClient, topic: &str, snapshot: &Snapshot) {
    let msg = build_snapshot_msg(snapshot);
    publish_json(client, topic, &msg, true).await;
}

// ---------------------------------------------------------------------------
// Snapshot diff → MQTT events
// ---------------------------------------------------------------------------

/// Publish per-entity events for what changed between two snapshots.
async fn publish_changes(client: &AsyncClient, topic: &str, old: &Snapshot, new: &Snapshot) {
    if old.alarm_state != new.alarm_state {
        info!("Alarm state changed: {} -> {}", old.alarm_state, new.alarm_state);
        let msg = MqttAlarmEvent {
            now: now_epoch_ms(),
            op: "ALARM_STATE".to_string(),
            state: alarm_panel::display_state(new.alarm_state),
        };
        publish_json(client, topic, &msg, false).await;
    }

    for (serial, device) in &new.door_window {
        let Some(prev) = old.door_window.get(serial) else {
            debug!("New door/window sensor {serial} ({})", device.name);
            continue;
        };
        if prev.is_open() != device.is_open() {
            let op = if device.is_open() { "DOOR_OPEN" } else { "DOOR_CLOSE" };
            info!("{op}: {serial} ({})", device.name);
            let msg = MqttDoorEvent {
                now: now_epoch_ms(),
                op: op.to_string(),
                serial: serial.clone(),
                name: device.name.clone(),
            };
            publish_json(client, topic, &msg, false).await;
        }
    }

    // A serial vanishing from every grouping it was in means the device was
    // removed or renamed upstream; dependent entities go unavailable.
    let mut lost: HashSet<&String> = HashSet::new();
    for serial in old.door_window.keys() {
        if !new.door_window.contains_key(serial) {
            lost.insert(serial);
        }
    }
    for serial in old.climate.keys() {
        if !new.climate.contains_key(serial) {
            lost.insert(serial);
        }
    }
    for serial in lost {
        warn!("Device {serial} disappeared from the overview");
        let msg = MqttDeviceLost {
            now: now_epoch_ms(),
            op: "DEVICE_LOST".to_string(),
            serial: serial.clone(),
        };
        publish_json(client, topic, &msg, false).await;
    }
}

// ---------------------------------------------------------------------------
// MQTT command handler
// ---------------------------------------------------------------------------

/// Execute a coordinator command future and log the result. Returns the
/// success flag and an error description for the CMD_ACK.
async fn exec_command(
    op: &str,
    fut: impl std::future::Future<Output = g4s_cloud::Result<()>>,
) -> (bool, Option<String>) {
    match fut.await {
        Ok(()) => {
            info!("{op}: success");
            (true, None)
        }
        Err(e) => {
            error!("{op} failed: {e}");
            (false, Some(e.to_string()))
        }
    }
}

async fn handle_command(
    payload_str: &str,
    cmd: MqttCommand,
    client: &AsyncClient,
    topic: &str,
    coordinator: &Arc<Coordinator>,
) {
    // Parse the raw payload as a JSON value for the CMD_ACK src field
    let src_json = serde_json::from_str::<serde_json::Value>(payload_str).ok();

    match cmd.op.as_str() {
        "SNAPSHOT" => {
            debug!("Command: SNAPSHOT");
            match coordinator.snapshot().await {
                Some(snapshot) => {
                    let msg = build_snapshot_msg(&snapshot);
                    let data = serde_json::to_value(&msg).ok();
                    publish_json(client, topic, &msg, true).await;
                    publish_cmd_ack(client, topic, true, src_json, data, None).await;
                }
                None => {
                    publish_cmd_ack(
                        client,
                        topic,
                        false,
                        src_json,
                        None,
                        Some("no snapshot yet".to_string()),
                    )
                    .await;
                }
            }
        }

        "PING" => {
            info!("Command: PING");
            publish_cmd_ack(client, topic, true, src_json, None, None).await;
        }

        "ARM_AWAY" => {
            info!("Command: ARM_AWAY");
            let (success, err) = exec_command("ARM_AWAY", coordinator.arm_away()).await;
            publish_cmd_ack(client, topic, success, src_json, None, err).await;
        }

        "ARM_NIGHT" => {
            info!("Command: ARM_NIGHT");
            let (success, err) = exec_command("ARM_NIGHT", coordinator.arm_night()).await;
            publish_cmd_ack(client, topic, success, src_json, None, err).await;
        }

        "DISARM" => {
            // Never log the code itself
            info!("Command: DISARM");
            let (success, err) =
                exec_command("DISARM", coordinator.disarm(cmd.code.as_deref())).await;
            publish_cmd_ack(client, topic, success, src_json, None, err).await;
        }

        other => {
            warn!("Unknown command: {other}");
            publish_cmd_ack(
                client,
                topic,
                false,
                src_json,
                None,
                Some(format!("unknown command: {other}")),
            )
            .await;
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=g4s_cloud=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Setup) => return setup::run_setup(&cli.config).await,
        Some(Command::Reauth) => return setup::run_reauth(&cli.config).await,
        None => {}
    }

    let mut config = Settings::load(&cli.config)?;

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        // Build the coordinator for this installation
        info!(
            "Starting bridge for installation {} (poll every {}s)",
            config.cloud.installation_id, config.cloud.poll_interval_secs
        );
        let coordinator = Arc::new(Coordinator::new(&config.session_config())?);

        // The first refresh gates everything: a credential failure must send
        // the user to the reauth flow, not into a retry loop.
        let first_snapshot = match coordinator.first_refresh().await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_auth() => {
                bail!("Cloud rejected the stored credentials ({e}); run `g4s2mqtt reauth`")
            }
            Err(e) => return Err(e).context("First status refresh failed"),
        };

        // Set up MQTT
        let (mqtt_host, mqtt_port) = parse_mqtt_url(&config.mqtt.url)?;
        let mut mqtt_opts = MqttOptions::new(&config.mqtt.client_id, &mqtt_host, mqtt_port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);

        let publish_topic = config.mqtt.publish_topic.clone();
        let subscribe_topic = config.mqtt.subscribe_topic.clone();

        client
            .subscribe(&subscribe_topic, QoS::AtLeastOnce)
            .await
            .context("Failed to subscribe to MQTT topic")?;
        info!("MQTT: subscribed to {subscribe_topic}");

        // Publish initial snapshot
        publish_snapshot(&client, &publish_topic, &first_snapshot).await;

        // Task 1: Coordinator event listener, republishes on every refresh
        let client_events = client.clone();
        let topic_events = publish_topic.clone();
        let mut event_rx = coordinator.subscribe();
        let mut prev_snapshot = first_snapshot;
        let event_handle = tokio::spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(CoordinatorEvent::SnapshotUpdated(snapshot)) => {
                        publish_snapshot(&client_events, &topic_events, &snapshot).await;
                        publish_changes(&client_events, &topic_events, &prev_snapshot, &snapshot)
                            .await;
                        prev_snapshot = snapshot;
                    }
                    Ok(CoordinatorEvent::RefreshFailed { message, auth }) => {
                        if auth {
                            error!(
                                "Refresh failed with an auth error: {message}; run `g4s2mqtt reauth`"
                            );
                        } else {
                            warn!("Refresh failed: {message}");
                        }
                        // Entities keep their last-known values; consumers see
                        // the update-failed signal
                        publish_simple_event(&client_events, &topic_events, "REFRESH_FAILED").await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Event receiver lagged, missed {n} events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        info!("Event channel closed");
                        break;
                    }
                }
            }
        });

        // Task 2: MQTT event loop (receives messages, handles commands)
        let coordinator_cmds = Arc::clone(&coordinator);
        let client_cmds = client.clone();
        let topic_cmds = publish_topic.clone();
        let sub_topic = subscribe_topic.clone();
        let mqtt_handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        // (Re)subscribe after every broker connect/reconnect.
                        // rumqttc does not auto-resubscribe, so without this a
                        // broker restart silently drops our subscription and we
                        // stop receiving commands.
                        info!("MQTT: connected, subscribing to {sub_topic}");
                        if let Err(e) = client_cmds.subscribe(&sub_topic, QoS::AtLeastOnce).await {
                            error!("Failed to subscribe to {sub_topic}: {e}");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        if msg.topic == sub_topic {
                            let payload = String::from_utf8_lossy(&msg.payload);
                            match serde_json::from_str::<MqttCommand>(&payload) {
                                Ok(cmd) => {
                                    // The payload may carry a disarm code;
                                    // log the op only
                                    info!("MQTT command received: {}", cmd.op);
                                    handle_command(
                                        &payload,
                                        cmd,
                                        &client_cmds,
                                        &topic_cmds,
                                        &coordinator_cmds,
                                    )
                                    .await;
                                }
                                Err(e) => {
                                    warn!("Failed to parse MQTT command: {e}");
                                }
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        // Task 3 lives inside the coordinator: fixed-interval status polling
        coordinator.start_polling();

        // Wait for a signal
        info!("MQTT bridge running. Send SIGHUP to restart, SIGINT/SIGTERM to stop.");
        let restart = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                false
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                false
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading config and restarting...");
                true
            }
        };

        // Abort tasks and stop polling
        event_handle.abort();
        mqtt_handle.abort();
        coordinator.shutdown();

        if !restart {
            break;
        }

        // Reload config from disk; keep previous config on failure
        info!("Reloading config from {}", cli.config);
        match Settings::load(&cli.config) {
            Ok(new_config) => {
                config = new_config;
                info!("Config reloaded successfully");
            }
            Err(e) => warn!("Failed to reload config, keeping previous: {e}"),
        }

        info!("Reconnecting...");
    }

    info!("Shutdown complete");
    Ok(())
}
