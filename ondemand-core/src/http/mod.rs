//! HTTP transport for the chat API
//!
//! This module implements the HTTP layer, handling:
//! - Endpoint URL construction for sessions and queries
//! - Buffered and chunk-by-chunk response bodies
//! - Error mapping for transport failures
//!
//! The rest of the crate talks to the network only through [`HttpTransport`],
//! so tests can substitute a scripted transport.

pub mod client;
pub mod error;

pub use client::HttpClient;
pub use error::{extract_error_message, TransportError};

use crate::config::SecretString;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Raw body chunks in arrival order; boundaries carry no meaning
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Type of API call being made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind<'a> {
    /// `POST /sessions`
    CreateSession,
    /// `POST /sessions/{id}/query`
    SubmitQuery { session_id: &'a str },
}

impl CallKind<'_> {
    /// Get the endpoint path for this call kind
    pub fn endpoint(&self) -> String {
        match self {
            CallKind::CreateSession => "/sessions".to_string(),
            CallKind::SubmitQuery { session_id } => format!("/sessions/{}/query", session_id),
        }
    }
}

/// Where requests go and how they authenticate
#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    base_url: String,
    api_key: SecretString,
}

impl ApiEndpoint {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// Build the full URL for a call kind
    pub fn url(&self, call_kind: CallKind<'_>) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            call_kind.endpoint()
        )
    }
}

/// Options for an HTTP request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Unique request ID for log correlation
    pub request_id: Uuid,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
        }
    }
}

impl RequestOptions {
    /// Create new request options with a generated request ID
    pub fn new() -> Self {
        Self::default()
    }
}

/// A response whose body has been read to the end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedResponse {
    pub status: u16,
    pub body: String,
}

/// A response whose body is still arriving
pub struct StreamingResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl StreamingResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// Drain the body into a string, lossily decoding UTF-8
    pub async fn into_text(mut self) -> Result<String, TransportError> {
        let mut raw = Vec::new();
        while let Some(chunk) = self.body.next().await {
            raw.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP transports
///
/// Both methods POST `body` as JSON with the `apikey` header. Neither
/// interprets the status code; that is the caller's protocol decision.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST and read the whole body
    async fn post_json(
        &self,
        url: &str,
        api_key: &SecretString,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<BufferedResponse, TransportError>;

    /// POST and hand back the body as it arrives
    async fn post_streaming(
        &self,
        url: &str,
        api_key: &SecretString,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<StreamingResponse, TransportError>;
}
