//! One end-to-end protocol run: session, then query

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{ClientConfig, ConfigError, ConfigValidator};
use crate::error::ClientError;
use crate::http::{ApiEndpoint, HttpClient, HttpTransport};
use crate::protocol::FinalResponse;
use crate::query::{QueryOutcome, QuerySubmitter};
use crate::session::SessionManager;

/// How a run ended
///
/// Every variant is a normal end of the process; failures have already been
/// logged with their status and body.
#[derive(Debug)]
pub enum RunOutcome {
    /// No session, so no query was sent
    SessionFailed(ClientError),
    /// The query was sent but produced no document
    QueryFailed(ClientError),
    /// The response mode has no handler
    Unhandled { mode: String },
    /// The final document
    Completed(FinalResponse),
}

impl RunOutcome {
    pub fn final_response(&self) -> Option<&FinalResponse> {
        match self {
            RunOutcome::Completed(document) => Some(document),
            _ => None,
        }
    }
}

/// Drives session creation and query submission for one configuration
pub struct ChatRun {
    config: ClientConfig,
    sessions: SessionManager,
    queries: QuerySubmitter,
}

impl ChatRun {
    /// Validate `config` and wire it to `transport`
    pub fn new(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Result<Self, ConfigError> {
        ConfigValidator::new().validate(&config)?;
        debug!(
            "Using base URL {} with API key {}",
            config.base_url,
            config.api_key.partial_redact()
        );

        let endpoint = ApiEndpoint::new(config.base_url.clone(), config.api_key.clone());
        let sessions = SessionManager::new(Arc::clone(&transport), endpoint.clone());
        let queries =
            QuerySubmitter::new(transport, endpoint).with_line_assembly(config.line_assembly);

        Ok(Self {
            config,
            sessions,
            queries,
        })
    }

    /// Validate `config` and build the default reqwest transport for it
    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        let client = HttpClient::with_config(&config.connection).map_err(|e| {
            ConfigError::Invalid {
                message: e.to_string(),
            }
        })?;
        Self::new(config, Arc::new(client))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run the protocol to completion
    pub async fn execute(&self) -> RunOutcome {
        let external_user_id = match self.config.external_user_id() {
            Some(id) => id.to_string(),
            None => {
                let generated = Uuid::new_v4().to_string();
                warn!("Generated external user id: {}", generated);
                generated
            }
        };

        let query = &self.config.query;
        let session = match self
            .sessions
            .create_session(&external_user_id, &query.agent_ids, &self.config.context_metadata)
            .await
        {
            Ok(session) => session,
            Err(err) => {
                report(&err);
                return RunOutcome::SessionFailed(err);
            }
        };

        info!("--- Submitting Query ---");
        info!("Using query: '{}'", query.query);
        info!("Using responseMode: '{}'", query.response_mode);

        match self
            .queries
            .submit_query(&session.id, &self.config.context_metadata, query)
            .await
        {
            Ok(QueryOutcome::Completed(document)) => {
                info!("Final Response (with contextMetadata appended)");
                RunOutcome::Completed(document)
            }
            Ok(QueryOutcome::Unhandled { mode }) => RunOutcome::Unhandled { mode },
            Err(err) => {
                report(&err);
                RunOutcome::QueryFailed(err)
            }
        }
    }
}

/// Log a protocol failure, with the server's own message when it has one
fn report(err: &ClientError) {
    error!("{}", err);
    if let Some(message) = err.server_message() {
        error!("Server message: {}", message);
    }
}
