//! Authentication error types
//!
//! ```rust
//! use chemviz::errors::AuthError;
//!
//! let err = AuthError::InvalidCredentials;
//! assert_eq!(err.error_code(), "UNAUTHORIZED");
//! ```

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown user or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No token in the request
    #[error("Authentication credentials were not provided")]
    MissingToken,

    /// Token does not belong to any user
    #[error("Invalid authentication token")]
    InvalidToken,

    /// Username is already registered
    #[error("Username already exists")]
    UserAlreadyExists,

    /// Invalid username format
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Password rejected by policy
    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl AuthError {
    /// Check if the caller must authenticate (401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken
        )
    }

    /// Check if this is a client error (400)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::UserAlreadyExists
                | AuthError::InvalidUsername(_)
                | AuthError::InvalidPassword(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken => {
                "UNAUTHORIZED"
            }
            AuthError::UserAlreadyExists => "CONFLICT",
            AuthError::InvalidUsername(_) | AuthError::InvalidPassword(_) => "VALIDATION_FAILED",
            AuthError::Hashing(_) => "INTERNAL_ERROR",
            AuthError::Database(_) => "DATABASE_ERROR",
        }
    }
}
