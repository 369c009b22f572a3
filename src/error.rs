// MIT License - Copyright (c) 2026 Peter Wright

use std::fmt;

/// Error codes returned by the G4S cloud in command/status responses.
///
/// The cloud wraps most failures as `{"error": {"code": "...", "message": "..."}}`
/// with a non-2xx HTTP status. Codes we do not recognize are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CloudErrorCode {
    /// Credentials rejected at login
    InvalidCredentials,
    /// Bearer token expired or revoked
    TokenExpired,
    /// Installation id unknown to this account
    UnknownInstallation,
    /// Panel not ready to arm (open zones)
    NotReadyToArm,
    /// Panel busy with a pending state change
    PanelBusy,
    /// Vendor-side maintenance window
    Maintenance,
    /// Anything else the cloud may invent
    Other(String),
}

impl CloudErrorCode {
    /// Parse a vendor error code string.
    pub fn from_code(s: &str) -> Self {
        match s {
            "INVALID_CREDENTIALS" => Self::InvalidCredentials,
            "TOKEN_EXPIRED" => Self::TokenExpired,
            "UNKNOWN_INSTALLATION" => Self::UnknownInstallation,
            "NOT_READY_TO_ARM" => Self::NotReadyToArm,
            "PANEL_BUSY" => Self::PanelBusy,
            "MAINTENANCE" => Self::Maintenance,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::UnknownInstallation => "UNKNOWN_INSTALLATION",
            Self::NotReadyToArm => "NOT_READY_TO_ARM",
            Self::PanelBusy => "PANEL_BUSY",
            Self::Maintenance => "MAINTENANCE",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for CloudErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All errors that can occur in the g4s-cloud library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Cloud API error {code}: {message}")]
    Api { code: CloudErrorCode, message: String },

    #[error("Invalid response from cloud: {details}")]
    InvalidResponse { details: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Disarm rejected: code does not match any user or access chip")]
    InvalidCode,

    #[error("No installation selected")]
    NoInstallation,
}

impl Error {
    /// Whether this error is transient and the next scheduled refresh should
    /// simply retry it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Api { code, .. } => matches!(
                code,
                CloudErrorCode::PanelBusy | CloudErrorCode::Maintenance
            ),
            Error::InvalidResponse { .. } => true,
            _ => false,
        }
    }

    /// Whether this error means the stored credentials are no longer valid.
    ///
    /// A first refresh failing with an auth error gates the interactive
    /// reauthentication flow, so it must be distinguishable from a transient
    /// fetch failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth { .. })
            || matches!(
                self,
                Error::Api {
                    code: CloudErrorCode::InvalidCredentials | CloudErrorCode::TokenExpired,
                    ..
                }
            )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_error_code_roundtrip() {
        assert_eq!(
            CloudErrorCode::from_code("INVALID_CREDENTIALS"),
            CloudErrorCode::InvalidCredentials
        );
        assert_eq!(
            CloudErrorCode::from_code("NOT_READY_TO_ARM").as_str(),
            "NOT_READY_TO_ARM"
        );
        assert_eq!(
            CloudErrorCode::from_code("SOMETHING_NEW"),
            CloudErrorCode::Other("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn test_auth_errors_not_retryable() {
        let err = Error::Auth { message: "bad password".into() };
        assert!(err.is_auth());
        assert!(!err.is_retryable());

        let err = Error::Api {
            code: CloudErrorCode::TokenExpired,
            message: "expired".into(),
        };
        assert!(err.is_auth());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transient_errors_retryable() {
        let err = Error::Api {
            code: CloudErrorCode::PanelBusy,
            message: "busy".into(),
        };
        assert!(err.is_retryable());
        assert!(!err.is_auth());

        let err = Error::InvalidResponse { details: "truncated".into() };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_invalid_code_is_neither() {
        let err = Error::InvalidCode;
        assert!(!err.is_retryable());
        assert!(!err.is_auth());
    }
}
