//! Error types for the conversion engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::formats::ParseError;

/// Errors that abort a conversion.
///
/// Recoverable content problems are not errors: they are collected into a
/// `ValidationResult` instead. `Validation` is only raised in strict mode.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to process file {}: {source}", path.display())]
    FileProcessing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {file}: {source}")]
    Parsing {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("Unsupported or mismatched file format: {0}")]
    InvalidFileFormat(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConvertError {
    /// Wraps a parse failure with the identifier of the input it came from.
    ///
    /// Format problems become `InvalidFileFormat` so callers can tell them
    /// apart from malformed content.
    pub fn from_parse(file: impl Into<String>, source: ParseError) -> Self {
        match source {
            ParseError::UnknownFormat => ConvertError::InvalidFileFormat(format!("{} (UNKNOWN)", file.into())),
            ParseError::WrongKind { format, .. } => ConvertError::InvalidFileFormat(format.to_string()),
            source => ConvertError::Parsing {
                file: file.into(),
                source,
            },
        }
    }
}

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
