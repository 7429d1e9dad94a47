//! Error types for loading training data.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing Matrix Market data or assembling
/// a problem from it.
#[derive(Debug, Error)]
pub enum DataError {
    /// A file could not be opened or created.
    #[error("Cannot access {path}: {source}")]
    File {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading or writing an already open stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The first line is not one of the supported Matrix Market banners.
    #[error("Unsupported Matrix Market header {header:?}")]
    UnsupportedHeader {
        /// The offending first line
        header: String,
    },

    /// The matrix is stored in a format the consumer does not accept.
    #[error("Unsupported {what} format: expected {expected}, found {found}")]
    WrongFormat {
        /// What was being loaded
        what: String,
        /// Accepted storage format
        expected: String,
        /// Storage format found in the file
        found: String,
    },

    /// A size line or data entry could not be parsed.
    #[error("Malformed Matrix Market data at line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// Description of the problem
        reason: String,
    },

    /// A label other than `1` or `-1`.
    #[error("Illegal label {value}: must be 1 or -1")]
    InvalidLabel {
        /// The label read from the file
        value: f64,
    },

    /// Two pieces of data disagree on their dimensions.
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// What was being checked
        what: String,
        /// Expected shape
        expected: String,
        /// Actual shape
        actual: String,
    },

    /// An instance added by hand does not fit the problem.
    #[error("Invalid instance: {reason}")]
    InvalidInstance {
        /// Description of the problem
        reason: String,
    },
}

impl DataError {
    /// Create a Malformed error.
    pub fn malformed<S: Into<String>>(line: usize, reason: S) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch<S, E, A>(what: S, expected: E, actual: A) -> Self
    where
        S: Into<String>,
        E: std::fmt::Display,
        A: std::fmt::Display,
    {
        Self::ShapeMismatch {
            what: what.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an InvalidInstance error.
    pub fn invalid_instance<S: Into<String>>(reason: S) -> Self {
        Self::InvalidInstance {
            reason: reason.into(),
        }
    }
}

/// Result type alias for data loading.
pub type Result<T> = std::result::Result<T, DataError>;
