//! Query submission and response handling
//!
//! [`QuerySubmitter`] builds the query body from a [`QueryConfig`], sends it
//! exactly once, and lets the response mode decide how the response is read:
//! buffered for `sync`, chunk by chunk for `stream`, not at all otherwise.

mod dispatch;
pub mod streaming;
pub mod sync;

pub use dispatch::ResponseMode;
pub use streaming::{
    aggregate_stream, AggregatedResult, LineAssembly, StreamAggregator, DATA_PREFIX, DONE_SENTINEL,
};
pub use sync::{handle_sync_response, splice_context_metadata, QUERY_OK};

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::QueryConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{ApiEndpoint, CallKind, HttpTransport, RequestOptions};
use crate::protocol::{ContextField, FinalResponse, QueryRequest};
use dispatch::Dispatch;

/// What a submitted query produced
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The final document, with context metadata spliced in
    Completed(FinalResponse),
    /// The response mode has no handler; nothing to print
    Unhandled { mode: String },
}

/// Submits queries against an existing session
#[derive(Clone)]
pub struct QuerySubmitter {
    transport: Arc<dyn HttpTransport>,
    endpoint: ApiEndpoint,
    line_assembly: LineAssembly,
}

impl QuerySubmitter {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: ApiEndpoint) -> Self {
        Self {
            transport,
            endpoint,
            line_assembly: LineAssembly::default(),
        }
    }

    /// Choose how streamed bodies are cut into lines
    pub fn with_line_assembly(mut self, line_assembly: LineAssembly) -> Self {
        self.line_assembly = line_assembly;
        self
    }

    /// Submit `config.query` to `session_id`
    pub async fn submit_query(
        &self,
        session_id: &str,
        context_metadata: &[ContextField],
        config: &QueryConfig,
    ) -> ClientResult<QueryOutcome> {
        let options = RequestOptions::new();
        let url = self.endpoint.url(CallKind::SubmitQuery { session_id });

        let body =
            serde_json::to_value(QueryRequest::from(config)).map_err(|source| {
                ClientError::Encode {
                    what: "query request",
                    source,
                }
            })?;

        info!(
            "Submitting query to URL: {} [request_id: {}]",
            url, options.request_id
        );
        debug!("Request body: {}", body);

        Dispatch {
            transport: self.transport.as_ref(),
            endpoint: &self.endpoint,
            url: &url,
            body: &body,
            context_metadata,
            line_assembly: self.line_assembly,
            options,
        }
        .run(&config.response_mode)
        .await
    }
}
