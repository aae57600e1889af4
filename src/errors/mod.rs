//! Domain-specific error types for chemviz
//!
//! # Error Categories
//!
//! - **IngestError**: problems with uploaded CSV content (empty, schema, no data)
//! - **DatasetError**: upload gating, persistence and export of datasets
//! - **AuthError**: registration, login and token checks
//!
//! Client-facing variants map to 4xx responses in `server::error`; database
//! and IO failures map to 5xx and are never retried.

pub mod auth;
pub mod dataset;
pub mod ingest;

pub use auth::AuthError;
pub use dataset::DatasetError;
pub use ingest::IngestError;

/// Result type alias for ingest pipeline operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type alias for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
