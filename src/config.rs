// MIT License - Copyright (c) 2026 Peter Wright

use secrecy::SecretString;

/// Default cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://smartalarm.g4s.dk/api/v1";

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Configuration for one authenticated cloud session.
///
/// Exactly one of these exists per configured installation; the coordinator
/// owns it for its lifetime. The password is held as a [`SecretString`] so it
/// never shows up in debug output or logs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Account email
    pub email: String,
    /// Account password
    pub password: SecretString,
    /// Installation (site) identifier; `None` until the setup flow picks one
    pub installation_id: Option<String>,
    /// Cloud endpoint base URL
    pub base_url: String,
    /// Status poll interval in seconds
    pub poll_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: SecretString::from(String::new()),
            installation_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl SessionConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.config.email = email.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = SecretString::from(password.into());
        self
    }

    pub fn installation_id(mut self, id: impl Into<String>) -> Self {
        self.config.installation_id = Some(id.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}
