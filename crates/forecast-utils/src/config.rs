//! Environment-driven configuration lookup
//!
//! Configuration structs across the workspace read their environment through
//! [`EnvLookup`] so tests can supply a map instead of mutating the process
//! environment.

use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// A required variable is unset or blank
    #[error("{0} is not set")]
    Missing(String),

    /// A variable is set but cannot be parsed
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

/// Source of environment variables
pub trait EnvLookup {
    /// Raw value of `name`, if set
    fn get(&self, name: &str) -> Option<String>;

    /// Trimmed, non-blank value of `name`
    fn optional(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed, non-blank value of `name`, or [`EnvError::Missing`]
    fn required(&self, name: &str) -> Result<String, EnvError> {
        self.optional(name)
            .ok_or_else(|| EnvError::Missing(name.to_string()))
    }

    /// Parse `name` when set
    fn parsed<T>(&self, name: &str) -> Result<Option<T>, EnvError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            None => Ok(None),
            Some(value) => value.parse::<T>().map(Some).map_err(|e| EnvError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
                value,
            }),
        }
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}
