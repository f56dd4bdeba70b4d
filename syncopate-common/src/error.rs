//! Common error types for Syncopate

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Common result type for Syncopate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when a non-2xx body carries no usable error text
pub const DEFAULT_API_ERROR: &str = "An error occurred";

/// Common error types across the Syncopate crates
///
/// The variants mirror what a screen needs to distinguish when it draws
/// itself: an expired session and an unavailable search service get their
/// own screens, everything else collapses into a one-line message.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure (connection refused, DNS, reset)
    #[error("Network error: {0}")]
    Http(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Non-2xx response with the server-provided message
    #[error("{message}")]
    Api { status: u16, message: String },

    /// HTTP 401 from an authenticated endpoint
    #[error("Session expired")]
    SessionExpired,

    /// HTTP 503 from the concert search endpoint
    #[error("Service unavailable")]
    ServiceUnavailable,

    /// Invalid caller input (never reaches the network)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Client-side form validation failure
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
}

impl Error {
    /// Map a non-2xx HTTP status and its raw body onto the error taxonomy
    ///
    /// 401 and 503 get distinct variants. Any other status carries the
    /// body's `error` (or `message`) field when it is JSON, else a default.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Error::SessionExpired,
            503 => Error::ServiceUnavailable,
            _ => Error::Api {
                status,
                message: server_message(body).unwrap_or_else(|| DEFAULT_API_ERROR.to_string()),
            },
        }
    }

    /// True for HTTP 401
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::SessionExpired)
    }
}

/// Extract the human-readable message from a JSON error body
pub fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(Error::from_status(401, ""), Error::SessionExpired));
        assert!(matches!(Error::from_status(503, "{}"), Error::ServiceUnavailable));

        match Error::from_status(400, r#"{"error": "Concert ID is required"}"#) {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Concert ID is required");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body_falls_back_to_default() {
        match Error::from_status(500, "<html>Internal Server Error</html>") {
            Error::Api { message, .. } => assert_eq!(message, DEFAULT_API_ERROR),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_message_field_used_when_error_missing() {
        assert_eq!(
            server_message(r#"{"message": "Invalid TOTP code"}"#).as_deref(),
            Some("Invalid TOTP code")
        );
        assert_eq!(server_message(r#"{"status": "ok"}"#), None);
    }
}
