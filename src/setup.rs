// MIT License - Copyright (c) 2026 Peter Wright
// Interactive setup wizard: collect credentials, pick an installation,
// write the bridge config file.

use std::path::Path;

use anyhow::{Context, Result, bail};
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};
use tracing::debug;

use g4s_cloud::config::DEFAULT_POLL_INTERVAL_SECS;
use g4s_cloud::{G4sClient, Installation, SessionConfig};

use crate::settings::{CloudSettings, MqttSettings, Settings};

const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Prompt for credentials until a login succeeds, then return them together
/// with the account's installations. Credential rejections re-prompt;
/// transport errors abort the wizard.
async fn login_step(default_email: Option<&str>) -> Result<(String, String, Vec<Installation>)> {
    let theme = ColorfulTheme::default();

    for attempt in 1..=MAX_LOGIN_ATTEMPTS {
        let mut email_prompt = Input::<String>::with_theme(&theme).with_prompt("G4S account email");
        if let Some(email) = default_email {
            email_prompt = email_prompt.default(email.to_string());
        }
        let email: String = email_prompt.interact_text()?;

        let password = Password::with_theme(&theme)
            .with_prompt("Password")
            .interact()?;

        let config = SessionConfig::builder()
            .email(email.as_str())
            .password(password.as_str())
            .build();
        let client = G4sClient::new(&config)?;

        match client.login().await {
            Ok(()) => {
                let installations = client
                    .installations()
                    .await
                    .context("Failed to list installations")?;
                return Ok((email, password, installations));
            }
            Err(e) if e.is_auth() => {
                eprintln!("Invalid credentials ({attempt}/{MAX_LOGIN_ATTEMPTS}), try again.");
                debug!("login rejected: {e}");
            }
            Err(e) => return Err(e).context("Could not reach the G4S cloud"),
        }
    }

    bail!("Too many failed login attempts")
}

/// Pick an installation; auto-selected when the account has exactly one.
fn installation_step(installations: &[Installation]) -> Result<&Installation> {
    match installations {
        [] => bail!("No installations found on this account"),
        [only] => {
            println!("Using installation: {} ({})", only.name, only.id);
            Ok(only)
        }
        many => {
            let names: Vec<&str> = many.iter().map(|i| i.name.as_str()).collect();
            let index = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Select installation")
                .items(&names)
                .default(0)
                .interact()?;
            Ok(&many[index])
        }
    }
}

/// Run the full setup wizard and write the config file.
pub async fn run_setup(config_path: impl AsRef<Path>) -> Result<()> {
    let theme = ColorfulTheme::default();
    let (email, password, installations) = login_step(None).await?;
    let installation = installation_step(&installations)?;

    let poll_interval_secs: u64 = Input::with_theme(&theme)
        .with_prompt("Poll interval (seconds)")
        .default(DEFAULT_POLL_INTERVAL_SECS)
        .interact_text()?;

    let mqtt_url: String = Input::with_theme(&theme)
        .with_prompt("MQTT broker URL")
        .default("mqtt://localhost:1883".to_string())
        .interact_text()?;

    let settings = Settings {
        cloud: CloudSettings {
            email,
            password,
            installation_id: installation.id.clone(),
            base_url: g4s_cloud::config::DEFAULT_BASE_URL.to_string(),
            poll_interval_secs,
        },
        mqtt: MqttSettings {
            url: mqtt_url,
            ..MqttSettings::default()
        },
    };

    settings.save(&config_path)?;
    println!("Configuration written to {}", config_path.as_ref().display());
    Ok(())
}

/// Re-authenticate: prompt for credentials only, keep everything else.
pub async fn run_reauth(config_path: impl AsRef<Path>) -> Result<()> {
    let mut settings = Settings::load(&config_path)?;

    let (email, password, installations) = login_step(Some(&settings.cloud.email)).await?;

    // Sanity check: the configured installation must still be visible
    if !installations.iter().any(|i| i.id == settings.cloud.installation_id) {
        bail!(
            "Installation {} is not visible to this account; re-run `g4s2mqtt setup`",
            settings.cloud.installation_id
        );
    }

    settings.cloud.email = email;
    settings.cloud.password = password;
    settings.save(&config_path)?;
    println!("Credentials updated in {}", config_path.as_ref().display());
    Ok(())
}
