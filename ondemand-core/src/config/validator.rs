//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::{ClientConfig, API_KEY_PLACEHOLDER};

/// Checks a [`ClientConfig`] before any network call is made
///
/// The response mode is deliberately not validated: an unrecognised mode is a
/// legal configuration that makes the query step inert.
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration, reporting the first offending field
    pub fn validate(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        self.validate_api_key(config)?;
        self.validate_base_url(config)?;
        self.validate_model_configs(config)?;
        self.validate_connection(config)?;
        Ok(())
    }

    fn validate_api_key(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        let api_key = config.api_key.expose_secret().trim();
        if api_key.is_empty() {
            return Err(ValidationError::required("api_key")
                .with_context("set it in the config file, ONDEMAND_API_KEY or --api-key"));
        }
        if api_key == API_KEY_PLACEHOLDER {
            return Err(ValidationError::new(
                "api_key",
                ValidationErrorKind::Placeholder {
                    value: API_KEY_PLACEHOLDER.to_string(),
                },
            ));
        }
        Ok(())
    }

    fn validate_base_url(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        if config.base_url.is_empty() {
            return Err(ValidationError::required("base_url"));
        }

        match url::Url::parse(&config.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
            Ok(url) => Err(ValidationError::new(
                "base_url",
                ValidationErrorKind::InvalidUrl {
                    message: format!("URL scheme must be http or https, got: {}", url.scheme()),
                },
            )),
            Err(e) => Err(ValidationError::new(
                "base_url",
                ValidationErrorKind::InvalidUrl {
                    message: e.to_string(),
                },
            )),
        }
    }

    fn validate_model_configs(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        let model = &config.query.model_configs;

        if !(0.0..=2.0).contains(&model.temperature) {
            return Err(ValidationError::out_of_range(
                "query.model_configs.temperature",
                "Must be between 0.0 and 2.0",
            ));
        }

        if !(0.0..=1.0).contains(&model.top_p) {
            return Err(ValidationError::out_of_range(
                "query.model_configs.top_p",
                "Must be between 0.0 and 1.0",
            ));
        }

        Ok(())
    }

    fn validate_connection(&self, config: &ClientConfig) -> Result<(), ValidationError> {
        if config.connection.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                "connection.connect_timeout_ms",
                "Must be greater than 0",
            ));
        }
        if config.connection.request_timeout_ms == Some(0) {
            return Err(ValidationError::out_of_range(
                "connection.request_timeout_ms",
                "Must be greater than 0 when set",
            ));
        }
        Ok(())
    }
}
