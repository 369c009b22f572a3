// MIT License - Copyright (c) 2026 Peter Wright
// Bridge configuration file handling, shared by the run/setup/reauth paths.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use g4s_cloud::SessionConfig;
use g4s_cloud::config::{DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL_SECS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub cloud: CloudSettings,
    pub mqtt: MqttSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSettings {
    pub email: String,
    pub password: String,
    /// Installation (site) identifier, as selected during setup
    pub installation_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttSettings {
    pub url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_subscribe_topic")]
    pub subscribe_topic: String,
    #[serde(default = "default_publish_topic")]
    pub publish_topic: String,
}

fn default_client_id() -> String {
    "g4s-bridge".to_string()
}
fn default_subscribe_topic() -> String {
    "g4s/cmd".to_string()
}
fn default_publish_topic() -> String {
    "g4s".to_string()
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            url: "mqtt://localhost:1883".to_string(),
            client_id: default_client_id(),
            subscribe_topic: default_subscribe_topic(),
            publish_topic: default_publish_topic(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// The cloud-session view of these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::builder()
            .email(self.cloud.email.as_str())
            .password(self.cloud.password.as_str())
            .installation_id(self.cloud.installation_id.as_str())
            .base_url(self.cloud.base_url.as_str())
            .poll_interval_secs(self.cloud.poll_interval_secs)
            .build()
    }
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
pub fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format mqtt://host:port")?;

    let port: u16 = port_str.parse().context("Invalid MQTT port number")?;

    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let settings: Settings = toml::from_str(
            r#"
            [cloud]
            email = "home@example.com"
            password = "hunter2"
            installation_id = "123456"

            [mqtt]
            url = "mqtt://broker:1883"
            "#,
        )
        .unwrap();

        assert_eq!(settings.cloud.poll_interval_secs, 60);
        assert_eq!(settings.cloud.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.mqtt.client_id, "g4s-bridge");
        assert_eq!(settings.mqtt.publish_topic, "g4s");
        assert_eq!(settings.mqtt.subscribe_topic, "g4s/cmd");
    }

    #[test]
    fn test_poll_interval_override() {
        let settings: Settings = toml::from_str(
            r#"
            [cloud]
            email = "home@example.com"
            password = "hunter2"
            installation_id = "123456"
            poll_interval_secs = 15

            [mqtt]
            url = "mqtt://broker:1883"
            "#,
        )
        .unwrap();
        assert_eq!(settings.cloud.poll_interval_secs, 15);
        assert_eq!(settings.session_config().poll_interval_secs, 15);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let settings = Settings {
            cloud: CloudSettings {
                email: "home@example.com".to_string(),
                password: "hunter2".to_string(),
                installation_id: "123456".to_string(),
                base_url: default_base_url(),
                poll_interval_secs: 30,
            },
            mqtt: MqttSettings::default(),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.cloud.email, settings.cloud.email);
        assert_eq!(loaded.cloud.poll_interval_secs, 30);
        assert_eq!(loaded.mqtt.url, settings.mqtt.url);
    }

    #[test]
    fn test_parse_mqtt_url() {
        assert_eq!(
            parse_mqtt_url("mqtt://broker:1883").unwrap(),
            ("broker".to_string(), 1883)
        );
        assert_eq!(
            parse_mqtt_url("tcp://10.0.0.2:8883").unwrap(),
            ("10.0.0.2".to_string(), 8883)
        );
        assert!(parse_mqtt_url("mqtt://no-port").is_err());
    }
}
