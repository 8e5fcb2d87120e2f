//! Environment-sourced configuration helpers
//!
//! Configuration is read once at startup. Everything goes through the
//! [`EnvSource`] trait so tests can hand in a plain map instead of touching
//! the process environment.

use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    /// A required variable is absent
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

/// A source of key/value configuration
pub trait EnvSource: Send + Sync {
    /// Look up a variable. Empty values are treated as absent.
    fn var(&self, key: &str) -> Option<String>;

    /// Look up a variable, falling back to `default`
    fn var_or(&self, key: &str, default: &str) -> String {
        self.var(key).unwrap_or_else(|| default.to_string())
    }

    /// Look up a required variable
    fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.var(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when it is absent
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
        Self: Sized,
    {
        match self.var(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.trim().is_empty()).cloned()
    }
}

impl EnvSource for HashMap<&'static str, &'static str> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .map(|v| (*v).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_var_or_default() {
        let source = env(&[("DATA_STORE_REGION", "eu")]);
        assert_eq!(source.var_or("DATA_STORE_REGION", "us"), "eu");
        assert_eq!(source.var_or("DATA_STORE_ID", "store"), "store");
    }

    #[test]
    fn test_empty_value_is_absent() {
        let source = env(&[("GOOGLE_CLOUD_PROJECT", "  ")]);
        assert!(source.var("GOOGLE_CLOUD_PROJECT").is_none());
        assert_eq!(
            source.require("GOOGLE_CLOUD_PROJECT"),
            Err(ConfigError::Missing("GOOGLE_CLOUD_PROJECT".to_string()))
        );
    }

    #[test]
    fn test_parse_or() {
        let source = env(&[("TUTOR_MAX_DOCUMENTS", " 5 "), ("TUTOR_TEMPERATURE", "hot")]);

        assert_eq!(source.parse_or("TUTOR_MAX_DOCUMENTS", 10_usize).unwrap(), 5);
        assert_eq!(source.parse_or("TUTOR_MAX_ITERATIONS", 10_usize).unwrap(), 10);

        let err = source.parse_or("TUTOR_TEMPERATURE", 0.7_f32).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "TUTOR_TEMPERATURE"));
        assert!(err.to_string().contains("hot"));
    }
}
