//! Ingest pipeline error types
//!
//! Every variant here describes a problem with the uploaded content itself,
//! so all of them are client errors.
//!
//! # Examples
//!
//! ```rust
//! use chemviz::errors::IngestError;
//! use chemviz::ingest::CanonicalHeader;
//!
//! let err = IngestError::Schema {
//!     missing: vec![CanonicalHeader::Flowrate, CanonicalHeader::Pressure],
//! };
//! assert_eq!(err.to_string(), "Missing required columns: Flowrate, Pressure");
//! ```

use thiserror::Error;

use crate::ingest::CanonicalHeader;

/// Errors raised while parsing, cleaning or aggregating a CSV upload
#[derive(Error, Debug)]
pub enum IngestError {
    /// The file has no data rows
    #[error("The uploaded CSV file is empty.")]
    EmptyInput,

    /// One or more canonical columns are absent from the header row
    #[error("Missing required columns: {}", format_missing(.missing))]
    Schema { missing: Vec<CanonicalHeader> },

    /// Rows exist but every one was blank in all required columns
    #[error("No valid data found after cleaning empty rows.")]
    NoValidData,

    /// The CSV reader could not make sense of the content
    #[error("CSV parsing error: {0}")]
    MalformedCsv(#[from] csv::Error),
}

fn format_missing(missing: &[CanonicalHeader]) -> String {
    missing
        .iter()
        .map(|header| header.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl IngestError {
    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestError::EmptyInput => "EMPTY_INPUT",
            IngestError::Schema { .. } => "SCHEMA_ERROR",
            IngestError::NoValidData => "NO_VALID_DATA",
            IngestError::MalformedCsv(_) => "MALFORMED_CSV",
        }
    }
}
