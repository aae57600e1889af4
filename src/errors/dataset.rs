//! Dataset error types
//!
//! This module provides structured error types for dataset operations,
//! covering upload gating, the ingest pipeline, persistence and export.
//!
//! # Examples
//!
//! ```rust
//! use chemviz::errors::DatasetError;
//!
//! let err = DatasetError::NotFound(42);
//! assert!(err.is_not_found());
//!
//! let err = DatasetError::UnsupportedFileType("notes.txt".to_string());
//! assert!(err.is_client_error());
//! ```

use thiserror::Error;

use super::IngestError;

/// Dataset operation errors
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Dataset not found by ID
    #[error("Dataset {0} not found")]
    NotFound(i32),

    /// Upload request carried no `file` field
    #[error("No file uploaded. Please provide a CSV file in the \"file\" field")]
    MissingFile,

    /// Upload does not have a `.csv` extension
    #[error("Only CSV files are allowed, got '{0}'")]
    UnsupportedFileType(String),

    /// Upload exceeds the configured size cap
    #[error("File size must be at most {limit} bytes (got {size})")]
    FileTooLarge { size: u64, limit: u64 },

    /// Content was rejected by the ingest pipeline
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Report rendering failed
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

impl DatasetError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DatasetError::MissingFile
                | DatasetError::UnsupportedFileType(_)
                | DatasetError::FileTooLarge { .. }
                | DatasetError::Ingest(_)
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetError::NotFound(_))
    }

    /// Check if this is a server error (500-series)
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            DatasetError::Database(_)
                | DatasetError::Io(_)
                | DatasetError::JsonError(_)
                | DatasetError::ExportFailed(_)
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            DatasetError::NotFound(_) => "NOT_FOUND",
            DatasetError::MissingFile => "MISSING_FILE",
            DatasetError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            DatasetError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            DatasetError::Ingest(err) => err.error_code(),
            DatasetError::Database(_) => "DATABASE_ERROR",
            DatasetError::Io(_) => "IO_ERROR",
            DatasetError::JsonError(_) => "JSON_ERROR",
            DatasetError::ExportFailed(_) => "OPERATION_FAILED",
        }
    }
}
