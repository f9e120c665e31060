// In: src/error.rs

//! This module defines the single, unified error type for the interchange importer.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterchangeError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to the conversion contract)
    // =========================================================================
    /// The input is neither a native `DataFrame` nor an interchange-capable object.
    #[error("`df` of type '{type_name}' does not support the dataframe interchange protocol")]
    UnsupportedInput { type_name: String },

    /// An Arrow type that the interchange protocol cannot describe.
    #[error("Data type not supported by the interchange protocol: {0}")]
    UnsupportedType(String),

    /// A protocol dtype that has no Arrow counterpart (unknown bit width, bad temporal format).
    #[error("Unsupported interchange data type: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid interchange buffer: {0}")]
    InvalidBuffer(String),

    #[error("Unsupported null encoding: {0}")]
    UnsupportedNullEncoding(String),

    /// A copy is needed to complete the conversion but the caller forbade it.
    #[error("Copy required but not allowed: {0}")]
    CopyNotAllowed(String),

    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// The foreign object broke the interchange contract (e.g. name/column count mismatch).
    #[error("Interchange protocol violation: {0}")]
    Protocol(String),

    #[error("Failed to convert column '{name}': {source}")]
    Column {
        name: String,
        #[source]
        source: Box<InterchangeError>,
    },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from the Serde JSON library, typically while loading a config.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error from the I/O subsystem, e.g. opening a log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InterchangeError {
    /// Wraps `self` with the name of the column that was being converted.
    pub fn in_column(self, name: impl Into<String>) -> Self {
        InterchangeError::Column {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any `Column` context layers.
    pub fn root_cause(&self) -> &InterchangeError {
        match self {
            InterchangeError::Column { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn copy_not_allowed(reason: impl Into<String>) -> Self {
        InterchangeError::CopyNotAllowed(reason.into())
    }
}
