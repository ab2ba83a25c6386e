use thiserror::Error;

/// Failure of a single host DOM operation.
///
/// None of these are fatal to a numbering pass; callers log them and move on
/// to the next selector or heading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Query '{selector}' failed: {message}")]
    QueryFailed { selector: String, message: String },

    #[error("Node is detached from the document")]
    Detached,

    #[error("Node is not an element")]
    NotAnElement,

    #[error("Failed to observe mutations: {0}")]
    ObserveFailed(String),

    #[error("DOM write failed: {0}")]
    WriteFailed(String),

    #[error("Event dispatch failed: {0}")]
    DispatchFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectorError {
    #[error("Selector parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("Empty selector")]
    Empty,
}
