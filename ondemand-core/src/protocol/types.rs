//! Wire types for the session and query endpoints
//!
//! Request bodies borrow from the caller's configuration so that building one
//! never clones the query text or agent list. Response types only declare the
//! fields this client reads; everything else in a server document is either
//! ignored or carried through untouched as a [`serde_json::Value`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::config::{ModelConfigs, QueryConfig};

/// Message attached to every aggregated streaming document
pub const STREAM_COMPLETED_MESSAGE: &str = "Chat query submitted successfully";

/// Status label attached to every aggregated streaming document
pub const STREAM_COMPLETED_STATUS: &str = "completed";

/// Caller-supplied key/value annotation, echoed verbatim in final output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextField {
    pub key: String,
    pub value: String,
}

impl ContextField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// Parses `key=value`. The value may itself contain `=`.
impl FromStr for ContextField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok(Self::new(key.trim(), value))
            }
            _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
        }
    }
}

/// Body of `POST {base}/sessions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest<'a> {
    pub agent_ids: &'a [String],
    pub external_user_id: &'a str,
    pub context_metadata: &'a [ContextField],
}

/// Success body of `POST {base}/sessions`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub data: SessionData,
}

/// A server-side conversation created for this run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub id: String,

    #[serde(default)]
    pub context_metadata: Vec<ContextField>,
}

/// Body of `POST {base}/sessions/{id}/query`
///
/// Every field is always serialized, including empty strings, empty arrays
/// and zeros.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub endpoint_id: &'a str,
    pub query: &'a str,
    pub agent_ids: &'a [String],
    pub response_mode: &'a str,
    pub reasoning_mode: &'a str,
    pub model_configs: ModelConfigsBody<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfigsBody<'a> {
    pub fulfillment_prompt: &'a str,
    pub stop_sequences: &'a [String],
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
}

impl<'a> From<&'a ModelConfigs> for ModelConfigsBody<'a> {
    fn from(configs: &'a ModelConfigs) -> Self {
        Self {
            fulfillment_prompt: &configs.fulfillment_prompt,
            stop_sequences: &configs.stop_sequences,
            temperature: configs.temperature,
            top_p: configs.top_p,
            max_tokens: configs.max_tokens,
            presence_penalty: configs.presence_penalty,
            frequency_penalty: configs.frequency_penalty,
        }
    }
}

impl<'a> From<&'a QueryConfig> for QueryRequest<'a> {
    fn from(config: &'a QueryConfig) -> Self {
        Self {
            endpoint_id: &config.endpoint_id,
            query: &config.query,
            agent_ids: &config.agent_ids,
            response_mode: config.response_mode.as_str(),
            reasoning_mode: &config.reasoning_mode,
            model_configs: ModelConfigsBody::from(&config.model_configs),
        }
    }
}

/// One decoded `data:` frame of a streaming query response
///
/// Fields are read one by one from the frame's JSON object, so a field of an
/// unexpected type is dropped on its own without losing the rest of the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A slice of the answer, plus the identifiers it belongs to
    Fulfillment {
        answer: Option<String>,
        session_id: Option<String>,
        message_id: Option<String>,
    },

    /// Usage and timing figures; the schema belongs to the server
    MetricsLog {
        public_metrics: Option<Map<String, Value>>,
    },

    /// Any other event type
    Other,
}

impl StreamEvent {
    /// Classify a frame by its `eventType`
    ///
    /// `None` when the frame is not an object or has no string `eventType`.
    pub fn from_value(frame: &Value) -> Option<Self> {
        let frame = frame.as_object()?;
        let string_field =
            |name: &str| frame.get(name).and_then(Value::as_str).map(str::to_string);

        let event = match frame.get("eventType")?.as_str()? {
            "fulfillment" => StreamEvent::Fulfillment {
                answer: string_field("answer"),
                session_id: string_field("sessionId"),
                message_id: string_field("messageId"),
            },
            "metricsLog" => StreamEvent::MetricsLog {
                public_metrics: frame
                    .get("publicMetrics")
                    .and_then(Value::as_object)
                    .cloned(),
            },
            _ => StreamEvent::Other,
        };
        Some(event)
    }
}

/// The document printed at the end of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct FinalResponse {
    document: Value,
}

impl FinalResponse {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    /// Pretty-printed JSON, keys in their original order
    pub fn to_pretty_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.document)
    }
}

/// Output shape of the streaming path
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StreamedDocument<'a> {
    pub message: &'static str,
    pub data: StreamedData<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StreamedData<'a> {
    pub session_id: &'a str,
    pub message_id: &'a str,
    pub answer: &'a str,
    pub metrics: &'a Map<String, Value>,
    pub status: &'static str,
    pub context_metadata: &'a [ContextField],
}
