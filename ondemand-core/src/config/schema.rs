//! Configuration schema structures with serde support

use serde::{Deserialize, Serialize};

use super::secrets::SecretString;
use crate::protocol::ContextField;
use crate::query::{LineAssembly, ResponseMode};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.on-demand.io/chat/v1";

/// Value left in freshly generated config files for the API key
pub const API_KEY_PLACEHOLDER: &str = "<your_api_key>";

/// Value left in freshly generated config files for the external user id
pub const EXTERNAL_USER_ID_PLACEHOLDER: &str = "<your_external_user_id>";

/// Root configuration for one client run
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// API key sent in the `apikey` header
    #[serde(default)]
    pub api_key: SecretString,

    /// API root, without the `/sessions` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Caller's identifier for the end user; generated when unset
    #[serde(default)]
    pub external_user_id: Option<String>,

    /// Annotations attached to the session and echoed in the final output
    #[serde(default)]
    pub context_metadata: Vec<ContextField>,

    /// Query submitted once the session exists
    #[serde(default)]
    pub query: QueryConfig,

    /// How streamed bytes are cut into lines
    #[serde(default)]
    pub line_assembly: LineAssembly,

    /// HTTP connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::default(),
            base_url: default_base_url(),
            external_user_id: None,
            context_metadata: Vec::new(),
            query: QueryConfig::default(),
            line_assembly: LineAssembly::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// The configured external user id, unless it is empty or the placeholder
    pub fn external_user_id(&self) -> Option<&str> {
        self.external_user_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != EXTERNAL_USER_ID_PLACEHOLDER)
    }
}

/// Query parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    #[serde(default = "default_endpoint_id")]
    pub endpoint_id: String,

    #[serde(default)]
    pub query: String,

    /// Agents (plugins) enabled for both the session and the query
    #[serde(default)]
    pub agent_ids: Vec<String>,

    #[serde(default)]
    pub response_mode: ResponseMode,

    #[serde(default = "default_reasoning_mode")]
    pub reasoning_mode: String,

    #[serde(default)]
    pub model_configs: ModelConfigs,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endpoint_id: default_endpoint_id(),
            query: String::new(),
            agent_ids: Vec::new(),
            response_mode: ResponseMode::default(),
            reasoning_mode: default_reasoning_mode(),
            model_configs: ModelConfigs::default(),
        }
    }
}

/// Sampling parameters forwarded to the fulfillment model
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfigs {
    #[serde(default)]
    pub fulfillment_prompt: String,

    #[serde(default)]
    pub stop_sequences: Vec<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// 0 lets the server pick
    #[serde(default)]
    pub max_tokens: u32,

    #[serde(default)]
    pub presence_penalty: f64,

    #[serde(default)]
    pub frequency_penalty: f64,
}

impl Default for ModelConfigs {
    fn default() -> Self {
        Self {
            fulfillment_prompt: String::new(),
            stop_sequences: Vec::new(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: 0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Whole-request timeout in milliseconds; unset means no limit
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: None,
            max_idle_per_host: default_max_idle(),
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_endpoint_id() -> String { "predefined-openai-gpt4.1".to_string() }
fn default_reasoning_mode() -> String { "grok-4-fast".to_string() }
fn default_temperature() -> f64 { 0.7 }
fn default_top_p() -> f64 { 1.0 }
fn default_connect_timeout() -> u64 { 10000 }
fn default_max_idle() -> usize { 10 }
