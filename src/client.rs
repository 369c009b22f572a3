// MIT License - Copyright (c) 2026 Peter Wright

//! Thin async adapter for the G4S SmartAlarm cloud REST API.
//!
//! This module is deliberately minimal glue: login for a bearer token, one
//! status endpoint, and the arm/disarm commands. Wire payloads decode into
//! the typed models in [`crate::model`] and nothing else in the crate talks
//! HTTP. The request timeout is fixed at construction and independent of any
//! user configuration.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::config::SessionConfig;
use crate::error::{CloudErrorCode, Error, Result};
use crate::model::{ArmMode, Installation, Overview};

/// Fixed per-request timeout. A stuck vendor call must never hold the
/// refresh lock for longer than this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error envelope the cloud wraps failures in.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// One authenticated session against the G4S cloud.
///
/// Holds the credentials so an expired token can be renewed transparently:
/// a 401 on any authenticated request triggers exactly one re-login and
/// retry. If the re-login itself is rejected the stored credentials are bad
/// and the error surfaces as an authentication failure.
pub struct G4sClient {
    http: reqwest::Client,
    base_url: Url,
    email: String,
    password: SecretString,
    installation_id: Option<String>,
    token: RwLock<Option<String>>,
}

impl G4sClient {
    /// Build a client from a session config. No network call happens here.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url,
            email: config.email.clone(),
            password: config.password.clone(),
            installation_id: config.installation_id.clone(),
            token: RwLock::new(None),
        })
    }

    /// The configured installation id, if any.
    pub fn installation_id(&self) -> Option<&str> {
        self.installation_id.as_deref()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn current_token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    fn store_token(&self, token: String) {
        *self.token.write().expect("token lock poisoned") = Some(token);
    }

    /// Authenticate and store a fresh bearer token.
    ///
    /// A 401/403 here means the credentials themselves were rejected.
    pub async fn login(&self) -> Result<()> {
        let url = self.endpoint("auth/login")?;
        debug!("logging in at {url}");

        let body = json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        });

        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Auth {
                message: format!("login rejected (HTTP {status}): {text}"),
            });
        }
        if !status.is_success() {
            return Err(Self::api_error(status, resp.text().await.unwrap_or_default()));
        }

        let login: LoginResponse = resp.json().await?;
        self.store_token(login.token);
        debug!("login successful");
        Ok(())
    }

    async fn ensure_token(&self) -> Result<()> {
        if self.current_token().is_none() {
            self.login().await?;
        }
        Ok(())
    }

    /// Map a non-2xx response to an error, preferring the vendor envelope.
    ///
    /// A 401/403 reaching this point survived the token-renewal retry, so it
    /// reflects rejected credentials rather than a stale token.
    fn api_error(status: StatusCode, body: String) -> Error {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body)
            && let Some(err) = envelope.error
        {
            return Error::Api {
                code: CloudErrorCode::from_code(&err.code),
                message: err.message.unwrap_or_default(),
            };
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Error::Auth {
                message: format!("HTTP {status}: {body}"),
            };
        }
        Error::InvalidResponse {
            details: format!("HTTP {status}: {body}"),
        }
    }

    /// Send an authenticated request, renewing the token once on 401.
    async fn send_authed(&self, build: impl Fn(&str) -> reqwest::RequestBuilder) -> Result<reqwest::Response> {
        self.ensure_token().await?;
        let token = self.current_token().unwrap_or_default();
        let resp = build(&token).send().await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        warn!("token rejected, re-authenticating");
        self.login().await?;
        let token = self.current_token().unwrap_or_default();
        Ok(build(&token).send().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let resp = self
            .send_authed(|token| self.http.get(url.clone()).bearer_auth(token))
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::api_error(status, resp.text().await.unwrap_or_default()));
        }
        Ok(resp.json().await?)
    }

    async fn post_command(&self, path: &str, body: serde_json::Value) -> Result<()> {
        let url = self.endpoint(path)?;
        let resp = self
            .send_authed(|token| self.http.post(url.clone()).bearer_auth(token).json(&body))
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::api_error(status, resp.text().await.unwrap_or_default()));
        }
        Ok(())
    }

    /// List the installations (sites) visible to this account.
    pub async fn installations(&self) -> Result<Vec<Installation>> {
        self.get_json("installations").await
    }

    /// Fetch the full status overview for the configured installation.
    pub async fn overview(&self) -> Result<Overview> {
        let id = self.require_installation()?;
        self.get_json(&format!("installations/{id}/overview")).await
    }

    /// Request an arm state change. The cloud acknowledges the request; the
    /// resulting state (usually PENDING_ARM first) shows up on the next
    /// overview fetch.
    pub async fn arm(&self, mode: ArmMode) -> Result<()> {
        let id = self.require_installation()?;
        debug!("arm ({}) installation {id}", mode.as_request_str());
        self.post_command(
            &format!("installations/{id}/panel/arm"),
            json!({ "mode": mode.as_request_str() }),
        )
        .await
    }

    /// Request a disarm. Code validation happens in the coordinator before
    /// this is ever called; the cloud applies its own checks regardless.
    pub async fn disarm(&self) -> Result<()> {
        let id = self.require_installation()?;
        debug!("disarm installation {id}");
        self.post_command(&format!("installations/{id}/panel/disarm"), json!({}))
            .await
    }

    fn require_installation(&self) -> Result<&str> {
        self.installation_id.as_deref().ok_or(Error::NoInstallation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_prefers_envelope() {
        let err = G4sClient::api_error(
            StatusCode::CONFLICT,
            r#"{"error": {"code": "NOT_READY_TO_ARM", "message": "zone open"}}"#.to_string(),
        );
        match err {
            Error::Api { code, message } => {
                assert_eq!(code, CloudErrorCode::NotReadyToArm);
                assert_eq!(message, "zone open");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_invalid_response() {
        let err = G4sClient::api_error(StatusCode::BAD_GATEWAY, "<html>oops</html>".to_string());
        assert!(matches!(err, Error::InvalidResponse { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_endpoint_join_keeps_base_path() {
        let config = SessionConfig::builder()
            .base_url("https://cloud.example/api/v1")
            .build();
        let client = G4sClient::new(&config).unwrap();
        let url = client.endpoint("auth/login").unwrap();
        assert_eq!(url.as_str(), "https://cloud.example/api/v1/auth/login");
    }

    #[test]
    fn test_missing_installation() {
        let config = SessionConfig::builder().build();
        let client = G4sClient::new(&config).unwrap();
        assert!(matches!(
            client.require_installation(),
            Err(Error::NoInstallation)
        ));
    }
}
