//! Error types for alert-relay
//!
//! Module-specific error type using thiserror, plus the HTTP mapping used by
//! the API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main error type for alert-relay
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Client sent something the relay cannot accept
    #[error("{0}")]
    InvalidInput(String),

    /// Invalid state for operation
    #[error("{0}")]
    InvalidState(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Alarm playback errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// Other errors
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// HTTP status for this error when surfaced to a caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::InvalidState(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures that belong to the audio backend
    pub fn is_playback_failure(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::AudioOutput(_) | Error::Playback(_)
        )
    }
}

impl From<alert_common::Error> for Error {
    fn from(err: alert_common::Error) -> Self {
        match err {
            alert_common::Error::Io(e) => Error::Io(e),
            alert_common::Error::InvalidInput(msg) => Error::InvalidInput(msg),
            alert_common::Error::NotFound(msg) => Error::NotFound(msg),
            alert_common::Error::Internal(msg) => Error::Internal(msg),
            other => Error::Config(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "detail": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience Result type using alert-relay Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(
            Error::InvalidInput("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidState("not ready".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        assert_eq!(
            Error::Internal("disk full".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Decode("garbage".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_playback_failure_classification() {
        assert!(Error::AudioOutput("no device".into()).is_playback_failure());
        assert!(Error::Decode("bad frame".into()).is_playback_failure());
        assert!(!Error::NotFound("alarm.mp3".into()).is_playback_failure());
    }

    #[test]
    fn test_common_config_error_converts() {
        let err: Error = alert_common::Error::Config("bad volume".into()).into();
        assert!(matches!(err, Error::Config(_)));
    }
}
