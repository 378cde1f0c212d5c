//! Secret handling for the API key
//!
//! The key is wrapped so that it never reaches a log line or a `{:?}` dump
//! by accident. Only [`SecretString::expose_secret`] hands out the raw value.

use serde::{Deserialize, Serialize};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// The API key, redacted in every formatted form
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for the `apikey` header only
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First two and last four characters, enough to tell keys apart in logs
    ///
    /// Keys of eight characters or fewer are hidden entirely.
    pub fn partial_redact(&self) -> String {
        let count = self.0.chars().count();
        match count {
            0 => "[EMPTY]".to_string(),
            1..=8 => REDACTED.to_string(),
            _ => {
                let head: String = self.0.chars().take(2).collect();
                let tail: String = self.0.chars().skip(count - 4).collect();
                format!("{head}...{tail}")
            }
        }
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
