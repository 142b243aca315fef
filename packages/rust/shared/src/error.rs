//! Error types for Remix Studio.
//!
//! Library crates use [`RemixStudioError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Remix Studio operations.
#[derive(Debug, thiserror::Error)]
pub enum RemixStudioError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Slide-deck container or XML extraction error.
    #[error("deck error: {message}")]
    Deck { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, empty dataset, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Dataset export error.
    #[error("export error: {0}")]
    Export(String),

    /// Network/HTTP error while fetching a preview image.
    #[error("network error: {0}")]
    Network(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RemixStudioError>;

impl RemixStudioError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a deck extraction error from any displayable message.
    pub fn deck(msg: impl Into<String>) -> Self {
        Self::Deck {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = RemixStudioError::config("sessions_root is not a directory");
        assert_eq!(
            err.to_string(),
            "config error: sessions_root is not a directory"
        );

        let err = RemixStudioError::deck("not a valid .pptx file");
        assert_eq!(err.to_string(), "deck error: not a valid .pptx file");

        let err = RemixStudioError::validation("schema_version 99 not supported");
        assert!(err.to_string().contains("schema_version 99"));
    }
}
