//! Errors raised while loading or checking a [`ClientConfig`]
//!
//! [`ClientConfig`]: super::ClientConfig

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a configuration could not be produced
///
/// Every variant is fatal and is reported before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file '{path}'{}: {message}", location(.line, .column))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Config file '{path}' must end in .yaml, .yml or .json")]
    UnsupportedFormat { path: String },

    #[error(transparent)]
    ValidationError(#[from] ValidationError),

    #[error("Config references ${{{var}}} but it is not set")]
    EnvVarNotFound { var: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at {line}:{column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

/// A field that failed validation
#[derive(Debug, Error)]
#[error("Invalid '{field_path}': {kind}{}", hint(.context))]
pub struct ValidationError {
    /// Dotted path of the field, e.g. `query.model_configs.top_p`
    pub field_path: String,
    pub kind: ValidationErrorKind,
    /// How to fix it, when there is something useful to say
    pub context: Option<String>,
}

fn hint(context: &Option<String>) -> String {
    context
        .as_deref()
        .map(|context| format!(" ({context})"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("value is required")]
    RequiredFieldMissing,

    #[error("placeholder '{value}' was left in place")]
    Placeholder { value: String },

    #[error("{message}")]
    OutOfRange { message: String },

    #[error("not a usable URL: {message}")]
    InvalidUrl { message: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }
}
