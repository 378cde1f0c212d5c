//! Environment variable interpolation for configuration files

use super::error::ConfigError;
use regex::Regex;
use std::env;

const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Replace every `${VAR}` in `content` with the value of `VAR`
///
/// Fails on the first referenced variable that is not set.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let env_var_pattern = Regex::new(ENV_VAR_PATTERN).map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })?;
    let mut missing_vars = Vec::new();

    let result = env_var_pattern.replace_all(content, |cap: &regex::Captures<'_>| {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing_vars.push(var_name.to_string());
                cap[0].to_string()
            }
        }
    });

    if let Some(var) = missing_vars.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound { var });
    }

    Ok(result.into_owned())
}
