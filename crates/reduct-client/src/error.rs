//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error returned by every fallible client operation.
///
/// `code` is either [`ClientError::CLIENT_ERROR`] for failures raised on the
/// client side (bad input, unreachable server, malformed JSON) or the HTTP
/// status the server answered with. Success is the `Ok` arm of [`Result`],
/// so an error never carries code 0.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{code}] {message}")]
pub struct ClientError {
    /// `-1` or the HTTP status code
    pub code: i32,
    /// Human readable description
    pub message: String,
}

impl ClientError {
    /// Code reserved for client-local failures
    pub const CLIENT_ERROR: i32 = -1;

    /// Create an error with an explicit code
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a client-local error (code -1)
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(Self::CLIENT_ERROR, message)
    }

    /// Build an error from a non-success HTTP response.
    ///
    /// The message is taken from a JSON `{"detail": ..}` body, then from the
    /// raw body text, then from the canonical reason phrase.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));

        let message = match detail {
            Some(detail) => detail,
            None if !body.trim().is_empty() => body.trim().to_string(),
            None => StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown error")
                .to_string(),
        };

        Self::new(i32::from(status), message)
    }

    /// The HTTP status behind this error, if it came from the server
    pub fn status(&self) -> Option<StatusCode> {
        u16::try_from(self.code)
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Check if the failure happened on the client side
    pub fn is_client_error(&self) -> bool {
        self.code == Self::CLIENT_ERROR
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::client(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::client(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::client(format!("Invalid URL: {}", err))
    }
}
