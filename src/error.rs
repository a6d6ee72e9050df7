// src/error.rs

//! Error types for the arena.

use std::time::Duration;
use thiserror::Error;

/// A mode configuration that cannot be run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("mode {mode}: {reason}")]
    Invalid { mode: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid(mode: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            mode: mode.to_string(),
            reason: reason.into(),
        }
    }
}

/// Why a decision provider did not produce a decision. Never leaves the engine.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("provider worker went away")]
    Disconnected,

    #[error("missing API key")]
    MissingApiKey,
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Malformed(err.to_string())
    }
}

/// Main error type for the arena.
#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for arena operations.
pub type Result<T> = std::result::Result<T, ArenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::invalid("stocks", "no instruments");
        assert_eq!(err.to_string(), "mode stocks: no instruments");

        let err = ArenaError::from(ConfigError::UnknownMode("forex".into()));
        assert_eq!(err.to_string(), "configuration error: unknown mode: forex");

        let err = ProviderError::Status { code: 503, body: "busy".into() };
        assert_eq!(err.to_string(), "provider returned status 503: busy");
    }

    #[test]
    fn json_errors_become_malformed() {
        let err: ProviderError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }
}
