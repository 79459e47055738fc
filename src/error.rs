//! # Error Types
//!
//! Every operation in barstamp returns [`Result`], and every failure names
//! the [`Stage`] that produced it. Failures that can be pinned to one input
//! symbol also carry that symbol's index in the request.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Encode,
    Metadata,
    Persist,
    Decode,
    Runtime,
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Encode => "encode",
            Stage::Metadata => "metadata",
            Stage::Persist => "persist",
            Stage::Decode => "decode",
            Stage::Runtime => "runtime",
            Stage::Config => "config",
        };
        f.write_str(name)
    }
}

/// Main error type for barstamp operations
#[derive(Debug, Error)]
pub enum BarstampError {
    /// Malformed dimensions, geometry that does not fit, or an unusable request
    #[error("Validation error{}: {message}", at(.index))]
    Validation {
        index: Option<usize>,
        message: String,
    },

    /// The barcode codec rejected a symbol
    #[error("Encode error{}: {message}", at(.index))]
    Encode {
        index: Option<usize>,
        message: String,
    },

    /// Dimensions of a base image could not be determined
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Directory creation or file write failed
    #[error("Persist error ({}): {message}", .path.display())]
    Persist { path: PathBuf, message: String },

    /// An input image could not be read or scanned
    #[error("Decode error: {0}")]
    Decode(String),

    /// The barcode codec runtime failed to load
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Configuration file unreadable or invalid
    #[error("Config error: {0}")]
    Config(String),
}

fn at(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" (symbol #{})", i),
        None => String::new(),
    }
}

impl BarstampError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            index: None,
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            index: None,
            message: message.into(),
        }
    }

    pub fn persist(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Persist {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// The stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Validation { .. } => Stage::Validation,
            Self::Encode { .. } => Stage::Encode,
            Self::Metadata(_) => Stage::Metadata,
            Self::Persist { .. } => Stage::Persist,
            Self::Decode(_) => Stage::Decode,
            Self::Runtime(_) => Stage::Runtime,
            Self::Config(_) => Stage::Config,
        }
    }

    /// Index of the input symbol that caused the error, when known.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Validation { index, .. } | Self::Encode { index, .. } => *index,
            _ => None,
        }
    }

    /// Attach an input index to a per-symbol error.
    ///
    /// Errors that are not tied to a single symbol are returned unchanged.
    pub fn at_index(self, i: usize) -> Self {
        match self {
            Self::Validation { message, .. } => Self::Validation {
                index: Some(i),
                message,
            },
            Self::Encode { message, .. } => Self::Encode {
                index: Some(i),
                message,
            },
            other => other,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BarstampError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_index() {
        let err = BarstampError::encode("content is empty").at_index(2);
        assert_eq!(err.to_string(), "Encode error (symbol #2): content is empty");
        assert_eq!(err.index(), Some(2));
        assert_eq!(err.stage(), Stage::Encode);
    }

    #[test]
    fn test_display_without_index() {
        let err = BarstampError::validation("no symbols to write");
        assert_eq!(err.to_string(), "Validation error: no symbols to write");
        assert_eq!(err.index(), None);
    }

    #[test]
    fn test_at_index_ignores_non_symbol_errors() {
        let err = BarstampError::Decode("bad file".into()).at_index(4);
        assert_eq!(err.index(), None);
        assert_eq!(err.stage(), Stage::Decode);
    }

    #[test]
    fn test_persist_display() {
        let err = BarstampError::persist("out/a.png", "permission denied");
        assert_eq!(err.to_string(), "Persist error (out/a.png): permission denied");
        assert_eq!(err.stage().to_string(), "persist");
    }
}
