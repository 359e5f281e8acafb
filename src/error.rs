//! Error types for coverage parsing

use std::path::PathBuf;
use thiserror::Error;

/// A failure while interpreting coverage content that is already in memory.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number, 0 when the failure is not tied to a line
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Errors raised while loading a coverage source
#[derive(Debug, Error)]
pub enum CoverageError {
    /// The coverage source does not exist
    #[error("Couldn't find coverage file at path '{}'", path.display())]
    NotFound { path: PathBuf },

    /// The coverage source exists but its content is malformed
    #[error("Coverage data had invalid formatting at path '{}' ({source})", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// The coverage source exists but could not be read
    #[error("Failed to read coverage file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoverageError {
    pub fn format(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Format {
            path: path.into(),
            source,
        }
    }
}
