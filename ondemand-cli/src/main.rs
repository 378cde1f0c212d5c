//! ondemand - chat API command-line client
//!
//! Creates a session, submits one query, and prints the final JSON document
//! on stdout. Progress and diagnostics go to stderr through `tracing`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ondemand_core::config::{load_from_path, ClientConfig};
use ondemand_core::{ChatRun, RunOutcome};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod args;

use args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// A non-empty `RUST_LOG` is used as is. Otherwise everything logs at warn
/// and this client at info, raised by `-v` (debug) or `-vv` (trace).
fn env_filter(rust_log: Option<&str>, verbose: u8) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::new(directives);
    }

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let mut env_filter = EnvFilter::new("warn");
    for target in ["ondemand", "ondemand_core"] {
        if let Ok(parsed) = format!("{}={}", target, level).parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }
    env_filter
}

/// Only configuration problems are errors here; protocol failures have been
/// logged by the run and still exit successfully
async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    cli.apply_overrides(&mut config);

    let chat = ChatRun::from_config(config).context("Invalid configuration")?;

    if let RunOutcome::Completed(document) = chat.execute().await {
        let formatted = document
            .to_pretty_string()
            .context("Failed to format final response")?;
        println!("{}", formatted);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::{Layer, Registry};

    fn max_level(filter: &EnvFilter) -> Option<LevelFilter> {
        <EnvFilter as Layer<Registry>>::max_level_hint(filter)
    }

    #[test]
    fn test_rust_log_wins_over_defaults() {
        let filter = env_filter(Some("ondemand_core=debug"), 0);
        assert_eq!(max_level(&filter), Some(LevelFilter::DEBUG));

        let filter = env_filter(Some("error"), 2);
        assert_eq!(max_level(&filter), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_verbosity_without_rust_log() {
        assert_eq!(max_level(&env_filter(None, 0)), Some(LevelFilter::INFO));
        assert_eq!(max_level(&env_filter(None, 1)), Some(LevelFilter::DEBUG));
        assert_eq!(max_level(&env_filter(Some("  "), 3)), Some(LevelFilter::TRACE));
    }
}
