//! Error types for name parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name string is empty.
    #[error("name cannot be empty")]
    Empty,

    /// The name contains only whitespace, which the CLI silently drops.
    #[error("name cannot be blank")]
    Blank,

    /// The name contains a control character (newlines would split CLI output).
    #[error("name contains a control character at byte {index}")]
    ControlCharacter { index: usize },
}

impl NameError {
    /// Returns true if this error indicates the input was empty or blank.
    pub fn is_empty(&self) -> bool {
        matches!(self, NameError::Empty | NameError::Blank)
    }
}
