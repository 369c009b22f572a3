//! Example: Arm away, wait out the pending window, then disarm.
//!
//! `G4S_EMAIL=... G4S_PASSWORD=... G4S_INSTALLATION=... G4S_CODE=... \
//!  cargo run --example arm_disarm`

use std::sync::Arc;
use std::time::Duration;

use g4s_cloud::{Coordinator, SessionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let code = std::env::var("G4S_CODE")?;
    let config = SessionConfig::builder()
        .email(std::env::var("G4S_EMAIL")?)
        .password(std::env::var("G4S_PASSWORD")?)
        .installation_id(std::env::var("G4S_INSTALLATION")?)
        .poll_interval_secs(10)
        .build();

    let coordinator = Arc::new(Coordinator::new(&config)?);
    let snapshot = coordinator.first_refresh().await?;
    println!("Current state: {}", snapshot.alarm_state);

    println!("Arming away...");
    coordinator.arm_away().await?;
    let snapshot = coordinator.snapshot().await.expect("snapshot after refresh");
    println!("State after arm request: {}", snapshot.alarm_state);

    // Give the panel a moment to finish the pending-arm window
    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = coordinator.refresh_now().await?;
    println!("State after pending window: {}", snapshot.alarm_state);

    println!("Disarming...");
    coordinator.disarm(Some(&code)).await?;
    let snapshot = coordinator.snapshot().await.expect("snapshot after refresh");
    println!("Final state: {}", snapshot.alarm_state);

    Ok(())
}
