//! Session creation
//!
//! A session is created once per run. Only an exact `201 Created` counts as
//! success; any other status is reported with its raw body and the query step
//! is skipped by the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiEndpoint, CallKind, HttpTransport, RequestOptions};
use crate::protocol::{ContextField, CreateSessionRequest, CreateSessionResponse, SessionData};

/// Status the session endpoint answers with on success
pub const SESSION_CREATED: u16 = 201;

/// Creates chat sessions
#[derive(Clone)]
pub struct SessionManager {
    transport: Arc<dyn HttpTransport>,
    endpoint: ApiEndpoint,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: ApiEndpoint) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    /// Create a session for `external_user_id` and return what the server
    /// echoed back
    pub async fn create_session(
        &self,
        external_user_id: &str,
        agent_ids: &[String],
        context_metadata: &[ContextField],
    ) -> ClientResult<SessionData> {
        let options = RequestOptions::new();
        let url = self.endpoint.url(CallKind::CreateSession);

        let request = CreateSessionRequest {
            agent_ids,
            external_user_id,
            context_metadata,
        };
        let body = serde_json::to_value(&request).map_err(|source| ClientError::Encode {
            what: "session request",
            source,
        })?;

        info!(
            "Creating session with URL: {} [request_id: {}]",
            url, options.request_id
        );
        debug!("Request body: {}", body);

        let response = self
            .transport
            .post_json(&url, self.endpoint.api_key(), &body, &options)
            .await?;

        if response.status != SESSION_CREATED {
            warn!(
                "Session creation returned {} [request_id: {}]",
                response.status, options.request_id
            );
            return Err(ClientError::SessionRejected {
                status: response.status,
                body: response.body,
            });
        }

        let parsed: CreateSessionResponse =
            serde_json::from_str(&response.body).map_err(|source| ClientError::Decode {
                what: "session response",
                source,
            })?;
        let session = parsed.data;

        if session.id.is_empty() {
            return Err(ClientError::MissingSessionId);
        }

        info!("Chat session created. Session ID: {}", session.id);
        if !session.context_metadata.is_empty() {
            info!("Context Metadata:");
            for field in &session.context_metadata {
                info!(" - {}", field);
            }
        }

        Ok(session)
    }
}
