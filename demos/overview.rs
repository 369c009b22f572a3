//! Example: Log in to the G4S cloud and print the installation overview.
//!
//! Credentials come from the environment:
//! `G4S_EMAIL=... G4S_PASSWORD=... G4S_INSTALLATION=... cargo run --example overview`

use g4s_cloud::{G4sClient, SessionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = SessionConfig::builder()
        .email(std::env::var("G4S_EMAIL")?)
        .password(std::env::var("G4S_PASSWORD")?)
        .installation_id(std::env::var("G4S_INSTALLATION")?)
        .build();

    let client = G4sClient::new(&config)?;
    let overview = client.overview().await?;

    println!("Alarm state: {}", overview.state);
    if let Some(who) = &overview.changed_by {
        println!("Last changed by: {who}");
    }

    println!("\n--- Devices ({}) ---", overview.devices.len());
    for device in &overview.devices {
        println!(
            "  {:10} {:24} kind={:24} battery={:>4} temp={:>6} open={}",
            device.serial,
            device.name,
            device.kind.model_name(),
            device
                .battery_level
                .map_or("-".to_string(), |b| format!("{b}%")),
            device
                .temperature
                .map_or("-".to_string(), |t| format!("{t:.1}C")),
            device.open.map_or("-".to_string(), |o| o.to_string()),
        );
    }

    println!("\n--- Users ({}) ---", overview.users.len());
    for user in &overview.users {
        println!(
            "  {} (code {})",
            user.name,
            if user.access_code.is_some() { "set" } else { "unset" }
        );
    }

    Ok(())
}
