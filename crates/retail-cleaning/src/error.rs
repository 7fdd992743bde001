//! Custom error types for the record normalization engine.
//!
//! Only batch-level problems are errors. Row-level problems (a category
//! mismatch, an unparsable date) are recovered inside the cleaner and show up
//! in the [`CleaningManifest`](crate::types::CleaningManifest) instead.
//!
//! Errors are serializable so a caller can forward them as `{code, message}`.

use crate::schema::Entity;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// An expected raw column is absent from the batch entirely.
    #[error("Batch for '{entity}' is missing expected column '{column}'")]
    BatchMalformed { entity: Entity, column: String },

    /// An entity schema violates its own invariants.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Entity name did not match any known entity.
    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    /// Raw input could not be shaped into a record batch.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Internal error (e.g., worker thread panic).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for callers that branch on error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BatchMalformed { .. } => "BATCH_MALFORMED",
            Self::InvalidSchema(_) => "INVALID_SCHEMA",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::UnknownEntity(_) => "UNKNOWN_ENTITY",
            Self::UnsupportedInput(_) => "UNSUPPORTED_INPUT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error signals upstream schema drift.
    pub fn is_batch_malformed(&self) -> bool {
        match self {
            Self::BatchMalformed { .. } => true,
            Self::WithContext { source, .. } => source.is_batch_malformed(),
            _ => false,
        }
    }
}

impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed() -> CleaningError {
        CleaningError::BatchMalformed {
            entity: Entity::Stores,
            column: "store_type".to_string(),
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(malformed().error_code(), "BATCH_MALFORMED");
        assert_eq!(
            CleaningError::UnknownEntity("pets".to_string()).error_code(),
            "UNKNOWN_ENTITY"
        );
    }

    #[test]
    fn test_is_batch_malformed() {
        assert!(malformed().is_batch_malformed());
        assert!(malformed().with_context("cleaning stores").is_batch_malformed());
        assert!(!CleaningError::InvalidConfig("x".to_string()).is_batch_malformed());
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_string(&malformed()).unwrap();
        assert!(json.contains("BATCH_MALFORMED"));
        assert!(json.contains("store_type"));
        assert!(json.contains("stores"));
    }

    #[test]
    fn test_with_context() {
        let error = malformed().with_context("During store cleaning");
        assert!(error.to_string().contains("During store cleaning"));
        assert_eq!(error.error_code(), "BATCH_MALFORMED");
    }
}
