//! Error handling for WASM bindings.
//!
//! Engine errors become JavaScript `Error` objects carrying a `code`
//! property, so the extension script can branch without parsing messages.

use secnum_dom::DomError;
use secnum_engine::{ConfigError, NumberingError};
use thiserror::Error;
use wasm_bindgen::prelude::*;

/// Error codes for TypeScript consumption.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid configuration object or selector
    Config,
    /// The page document is unavailable
    Dom,
    /// Unrecognised popup message
    Command,
    Unknown,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG_ERROR",
            ErrorCode::Dom => "DOM_ERROR",
            ErrorCode::Command => "COMMAND_ERROR",
            ErrorCode::Unknown => "UNKNOWN_ERROR",
        }
    }
}

/// A JavaScript-friendly error.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SecnumError {
    code: ErrorCode,
    message: String,
}

impl SecnumError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Command, message)
    }
}

impl From<NumberingError> for SecnumError {
    fn from(err: NumberingError) -> Self {
        match err {
            NumberingError::Config(_) => Self::new(ErrorCode::Config, err.to_string()),
        }
    }
}

impl From<ConfigError> for SecnumError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorCode::Config, err.to_string())
    }
}

impl From<DomError> for SecnumError {
    fn from(err: DomError) -> Self {
        Self::new(ErrorCode::Dom, err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for SecnumError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<SecnumError> for JsValue {
    fn from(err: SecnumError) -> Self {
        let js_error = js_sys::Error::new(&err.message);
        js_sys::Reflect::set(
            &js_error,
            &"code".into(),
            &JsValue::from_str(err.code.as_str()),
        )
        .ok();
        js_error.into()
    }
}
