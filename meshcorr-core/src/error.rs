//! Error types for meshcorr

use crate::point::PointSetRole;
use thiserror::Error;

/// Main error type for meshcorr operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot build a spatial index over an empty {0} point set")]
    EmptyPointSet(PointSetRole),

    #[error("Non-finite coordinate in {role} point {index}")]
    NonFinitePoint { role: PointSetRole, index: usize },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Shorthand for a parse failure on a 1-based line number
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for meshcorr operations
pub type Result<T> = std::result::Result<T, Error>;
