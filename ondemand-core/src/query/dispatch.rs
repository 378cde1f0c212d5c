//! Response mode selection and routing

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

use super::streaming::{aggregate_stream, LineAssembly};
use super::sync::handle_sync_response;
use super::QueryOutcome;
use crate::error::ClientResult;
use crate::http::{ApiEndpoint, HttpTransport, RequestOptions};
use crate::protocol::ContextField;

/// How the query result is delivered
///
/// The raw string is kept for modes this client does not know, because it is
/// still sent to the server verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseMode {
    /// One JSON document
    #[default]
    Sync,
    /// Server-sent `data:` frames
    Stream,
    /// Anything else; the query is sent but its result is not consumed
    Unrecognized(String),
}

impl ResponseMode {
    pub fn parse(mode: &str) -> Self {
        match mode {
            "sync" => ResponseMode::Sync,
            "stream" => ResponseMode::Stream,
            other => ResponseMode::Unrecognized(other.to_string()),
        }
    }

    /// The wire value
    pub fn as_str(&self) -> &str {
        match self {
            ResponseMode::Sync => "sync",
            ResponseMode::Stream => "stream",
            ResponseMode::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ResponseMode::Unrecognized(_))
    }
}

impl From<String> for ResponseMode {
    fn from(mode: String) -> Self {
        Self::parse(&mode)
    }
}

impl From<&str> for ResponseMode {
    fn from(mode: &str) -> Self {
        Self::parse(mode)
    }
}

impl From<ResponseMode> for String {
    fn from(mode: ResponseMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the dispatcher needs for one send
pub(crate) struct Dispatch<'a> {
    pub transport: &'a dyn HttpTransport,
    pub endpoint: &'a ApiEndpoint,
    pub url: &'a str,
    pub body: &'a Value,
    pub context_metadata: &'a [ContextField],
    pub line_assembly: LineAssembly,
    pub options: RequestOptions,
}

impl Dispatch<'_> {
    /// Send once, then consume the response the way `mode` asks for
    pub async fn run(self, mode: &ResponseMode) -> ClientResult<QueryOutcome> {
        let api_key = self.endpoint.api_key();

        match mode {
            ResponseMode::Sync => {
                let response = self
                    .transport
                    .post_json(self.url, api_key, self.body, &self.options)
                    .await?;
                let document = handle_sync_response(response, self.context_metadata)?;
                Ok(QueryOutcome::Completed(document))
            }
            ResponseMode::Stream => {
                info!("Streaming Response... [request_id: {}]", self.options.request_id);
                let response = self
                    .transport
                    .post_streaming(self.url, api_key, self.body, &self.options)
                    .await?;
                let result = aggregate_stream(response, self.line_assembly).await?;
                let document = result.into_final_response(self.context_metadata)?;
                Ok(QueryOutcome::Completed(document))
            }
            ResponseMode::Unrecognized(raw) => {
                let response = self
                    .transport
                    .post_json(self.url, api_key, self.body, &self.options)
                    .await?;
                debug!(
                    "Response mode '{}' has no handler; ignoring status {} [request_id: {}]",
                    raw, response.status, self.options.request_id
                );
                Ok(QueryOutcome::Unhandled { mode: raw.clone() })
            }
        }
    }
}
