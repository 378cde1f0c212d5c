//! Configuration module
//!
//! Configuration is an explicit, immutable record handed to the session and
//! query components. It can be loaded from a YAML or JSON file, with `${VAR}`
//! references resolved from the environment before parsing. Loading does not
//! validate: callers layer their overrides first and then run
//! [`ConfigValidator`], which [`crate::run::ChatRun::new`] does for them.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::interpolate_env_vars;
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ClientConfig, ConnectionConfig, ModelConfigs, QueryConfig, API_KEY_PLACEHOLDER,
    DEFAULT_BASE_URL, EXTERNAL_USER_ID_PLACEHOLDER,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ClientConfig> {
    let path = path.as_ref();
    let content = read_interpolated(path)?;

    serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_string_lossy().to_string(),
        line: e.location().map(|l| l.line()),
        column: e.location().map(|l| l.column()),
        message: e.to_string(),
    })
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ClientConfig> {
    let path = path.as_ref();
    let content = read_interpolated(path)?;

    serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_string_lossy().to_string(),
        line: Some(e.line()),
        column: Some(e.column()),
        message: e.to_string(),
    })
}

/// Load a configuration file, picking the format from its extension
pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<ClientConfig> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml") | Some("yml") => load_from_yaml(path),
        Some("json") => load_from_json(path),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_string_lossy().to_string(),
        }),
    }
}

fn read_interpolated(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    env::interpolate_env_vars(&content)
}
