//! Defines the error types for all engine operations.

use secnum_dom::{DomError, SelectorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("Invalid level {level} for class marker '{class}'")]
    MarkerLevel { class: String, level: u8 },

    #[error("max_level must be between 1 and 6, got {0}")]
    MaxLevel(u8),

    #[error("Font thresholds must be positive and strictly descending")]
    FontThresholds,

    #[error("At least one level resolver is required")]
    NoResolvers,

    #[error("Invalid identifier for '{field}': '{value}'")]
    Identifier { field: &'static str, value: String },

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to number (or un-number) one heading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("Failed to write prefix '{prefix}': {source}")]
    Write {
        prefix: String,
        #[source]
        source: DomError,
    },

    #[error("Failed to dispatch edit signals: {0}")]
    Signals(#[source] DomError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreferenceError {
    #[error("Preference store unavailable: {0}")]
    Unavailable(String),

    #[error("Preference store lock poisoned")]
    LockPoisoned,
}

/// Errors from building an engine.
#[derive(Error, Debug)]
pub enum NumberingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
