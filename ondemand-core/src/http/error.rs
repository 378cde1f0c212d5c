//! HTTP error mapping utilities

use serde_json::Value;
use thiserror::Error;

/// Failures below the protocol level: nothing usable came back
#[derive(Debug, Error)]
pub enum TransportError {
    /// The reqwest client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Build(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Could not connect
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Sending failed for another reason
    #[error("Request failed: {0}")]
    Request(String),

    /// Reading the response body failed
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Pull a human-readable message out of an error body, if it has one
///
/// Recognised shapes, in order: `{"error": {"message": ...}}`,
/// `{"message": ...}`, `{"error": "..."}`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;

    if let Some(message) = json
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    if let Some(message) = json.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    json.get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}
