//! Protocol-level error types

use crate::http::{extract_error_message, TransportError};
use thiserror::Error;

/// Result type for session and query operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while creating a session or submitting a query
///
/// None of these are fatal to the process. The run orchestrator reports them
/// and stops the protocol early.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Nothing usable came back from the network
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Session creation returned something other than 201
    #[error("Error creating chat session: {status} - {body}")]
    SessionRejected { status: u16, body: String },

    /// Session creation succeeded but carried no id
    #[error("Chat session created without an id")]
    MissingSessionId,

    /// Query submission returned something other than 200
    #[error("Error submitting {mode} query: {status} - {body}")]
    QueryRejected {
        mode: &'static str,
        status: u16,
        body: String,
    },

    /// A success body that is not the JSON document it should be
    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The request body could not be encoded
    #[error("Failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// HTTP status for rejections, `None` for everything else
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::SessionRejected { status, .. }
            | ClientError::QueryRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided error message, when the rejection body carries one
    pub fn server_message(&self) -> Option<String> {
        match self {
            ClientError::SessionRejected { body, .. } | ClientError::QueryRejected { body, .. } => {
                extract_error_message(body)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display_includes_status_and_body() {
        let err = ClientError::SessionRejected {
            status: 500,
            body: "internal".to_string(),
        };
        assert_eq!(err.to_string(), "Error creating chat session: 500 - internal");
        assert_eq!(err.status(), Some(500));

        let err = ClientError::QueryRejected {
            mode: "stream",
            status: 404,
            body: r#"{"message":"session not found"}"#.to_string(),
        };
        assert!(err.to_string().starts_with("Error submitting stream query: 404"));
        assert_eq!(err.server_message().as_deref(), Some("session not found"));
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let err = ClientError::from(TransportError::Timeout);
        assert_eq!(err.status(), None);
        assert_eq!(err.server_message(), None);
    }
}
