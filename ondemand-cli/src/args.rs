//! CLI argument definitions using Clap
//!
//! Every flag overrides the matching field of the config file, if one is
//! given. Flags that also read an `ONDEMAND_*` environment variable let the
//! API key stay out of shell history.

use clap::{Parser, ValueEnum};
use ondemand_core::{ClientConfig, ContextField, LineAssembly, ResponseMode};
use std::path::PathBuf;

/// Open a chat session and submit one query
#[derive(Parser, Debug)]
#[command(name = "ondemand")]
#[command(version, about = "Open a chat session and submit one query")]
pub struct Cli {
    /// Config file (.yaml, .yml or .json)
    #[arg(short, long, env = "ONDEMAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// API key sent in the `apikey` header
    #[arg(long, env = "ONDEMAND_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API root URL
    #[arg(long, env = "ONDEMAND_BASE_URL")]
    pub base_url: Option<String>,

    /// End-user identifier; a random UUID is used when unset
    #[arg(long, env = "ONDEMAND_EXTERNAL_USER_ID")]
    pub external_user_id: Option<String>,

    /// Query text
    #[arg(short, long)]
    pub query: Option<String>,

    /// `sync` or `stream`; other values send the query but print nothing
    #[arg(short = 'm', long)]
    pub response_mode: Option<String>,

    /// Fulfillment endpoint
    #[arg(long)]
    pub endpoint_id: Option<String>,

    /// Reasoning mode
    #[arg(long)]
    pub reasoning_mode: Option<String>,

    /// Agent (plugin) id; repeatable, replaces the configured list
    #[arg(long = "agent-id")]
    pub agent_ids: Vec<String>,

    /// Context metadata as KEY=VALUE; repeatable, replaces the configured list
    #[arg(long = "context", value_name = "KEY=VALUE")]
    pub context: Vec<ContextField>,

    /// Fulfillment prompt
    #[arg(long)]
    pub fulfillment_prompt: Option<String>,

    /// Stop sequence; repeatable, replaces the configured list
    #[arg(long = "stop-sequence")]
    pub stop_sequences: Vec<String>,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub top_p: Option<f64>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub presence_penalty: Option<f64>,

    #[arg(long)]
    pub frequency_penalty: Option<f64>,

    /// How streamed bytes are cut into lines
    #[arg(long, value_enum)]
    pub line_assembly: Option<LineAssemblyArg>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LineAssemblyArg {
    /// Rebuild lines split across chunks
    Buffered,
    /// Split every chunk on its own
    PerChunk,
}

impl From<LineAssemblyArg> for LineAssembly {
    fn from(arg: LineAssemblyArg) -> Self {
        match arg {
            LineAssemblyArg::Buffered => LineAssembly::Buffered,
            LineAssemblyArg::PerChunk => LineAssembly::PerChunk,
        }
    }
}

impl Cli {
    /// Layer the flags over `config`
    pub fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.as_str().into();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(external_user_id) = &self.external_user_id {
            config.external_user_id = Some(external_user_id.clone());
        }
        if !self.context.is_empty() {
            config.context_metadata = self.context.clone();
        }
        if let Some(line_assembly) = self.line_assembly {
            config.line_assembly = line_assembly.into();
        }

        let query = &mut config.query;
        if let Some(text) = &self.query {
            query.query = text.clone();
        }
        if let Some(mode) = &self.response_mode {
            query.response_mode = ResponseMode::parse(mode);
        }
        if let Some(endpoint_id) = &self.endpoint_id {
            query.endpoint_id = endpoint_id.clone();
        }
        if let Some(reasoning_mode) = &self.reasoning_mode {
            query.reasoning_mode = reasoning_mode.clone();
        }
        if !self.agent_ids.is_empty() {
            query.agent_ids = self.agent_ids.clone();
        }

        let model = &mut query.model_configs;
        if let Some(prompt) = &self.fulfillment_prompt {
            model.fulfillment_prompt = prompt.clone();
        }
        if !self.stop_sequences.is_empty() {
            model.stop_sequences = self.stop_sequences.clone();
        }
        if let Some(temperature) = self.temperature {
            model.temperature = temperature;
        }
        if let Some(top_p) = self.top_p {
            model.top_p = top_p;
        }
        if let Some(max_tokens) = self.max_tokens {
            model.max_tokens = max_tokens;
        }
        if let Some(presence_penalty) = self.presence_penalty {
            model.presence_penalty = presence_penalty;
        }
        if let Some(frequency_penalty) = self.frequency_penalty {
            model.frequency_penalty = frequency_penalty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ondemand").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = parse(&[
            "--api-key",
            "flag-key",
            "-q",
            "hello",
            "-m",
            "stream",
            "--agent-id",
            "a1",
            "--agent-id",
            "a2",
            "--context",
            "userId=1",
            "--context",
            "name=John",
            "--temperature",
            "0.1",
            "--line-assembly",
            "per-chunk",
        ]);

        let mut config = ClientConfig::default();
        config.context_metadata = vec![ContextField::new("old", "x")];
        cli.apply_overrides(&mut config);

        assert_eq!(config.api_key.expose_secret(), "flag-key");
        assert_eq!(config.query.query, "hello");
        assert_eq!(config.query.response_mode, ResponseMode::Stream);
        assert_eq!(config.query.agent_ids, vec!["a1", "a2"]);
        assert_eq!(
            config.context_metadata,
            vec![ContextField::new("userId", "1"), ContextField::new("name", "John")]
        );
        assert_eq!(config.query.model_configs.temperature, 0.1);
        assert_eq!(config.line_assembly, LineAssembly::PerChunk);
    }

    #[test]
    fn test_no_flags_leave_config_untouched() {
        let cli = parse(&[]);
        let mut config = ClientConfig::default();
        config.query.agent_ids = vec!["keep".to_string()];
        cli.apply_overrides(&mut config);

        assert_eq!(config.query.agent_ids, vec!["keep"]);
        assert_eq!(config.query.response_mode, ResponseMode::Sync);
    }

    #[test]
    fn test_bad_context_rejected() {
        let result = Cli::try_parse_from(["ondemand", "--context", "novalue"]);
        assert!(result.is_err());
    }
}
