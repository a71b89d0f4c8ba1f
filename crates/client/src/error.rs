//! Errors surfaced by the data-access layer.
//!
//! Every variant carries a human-readable message. The type is `Clone` so a
//! failure of a coalesced read can be handed to every waiting caller.

use thiserror::Error;

/// Errors that can occur when talking to the Lampstand backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Non-2xx response. `message` is the backend's message when it sent one.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx response whose envelope reported `success: false`.
    #[error("{0}")]
    Application(String),

    /// Login was rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The access token expired and could not be refreshed.
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// The response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// A successful envelope without the `data` the endpoint promises.
    #[error("Response from {0} contained no data")]
    MissingData(String),

    /// Reading or writing stored credentials failed.
    #[error("Credential storage error: {0}")]
    Storage(String),

    /// The request could not be built (bad parameters or body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status code, when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Failures that may succeed if the caller simply tries again.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status { status, .. } => matches!(*status, 502..=504),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<crate::session::StoreError> for ApiError {
    fn from(err: crate::session::StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_displays_backend_message() {
        let err = ApiError::Status {
            status: 404,
            message: "Topic not found".to_string(),
        };
        assert_eq!(err.to_string(), "Topic not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_session_expired_message() {
        let err = ApiError::SessionExpired;
        assert!(err.is_session_expired());
        assert_eq!(err.to_string(), "Session expired. Please log in again.");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Timeout.is_transient());
        assert!(ApiError::Network("refused".to_string()).is_transient());
        assert!(
            ApiError::Status {
                status: 503,
                message: "unavailable".to_string()
            }
            .is_transient()
        );
        assert!(!ApiError::Application("nope".to_string()).is_transient());
        assert!(!ApiError::SessionExpired.is_transient());
    }

    #[test]
    fn test_missing_data_message() {
        let err = ApiError::MissingData("/topics/1".to_string());
        assert_eq!(err.to_string(), "Response from /topics/1 contained no data");
    }
}
