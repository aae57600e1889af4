use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::errors::{AuthError, DatasetError};

/// Error returned by every handler; renders as
/// `{"error": <code>, "detail": <message>}`.
#[derive(Debug)]
pub enum ApiError {
    Dataset(DatasetError),
    Auth(AuthError),
    BadRequest(String),
}

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        ApiError::Dataset(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Dataset(DatasetError::FileTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Dataset(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Dataset(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Dataset(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(err) if err.is_unauthorized() => StatusCode::UNAUTHORIZED,
            ApiError::Auth(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Dataset(err) => err.error_code(),
            ApiError::Auth(err) => err.error_code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Dataset(err) => err.to_string(),
            ApiError::Auth(err) => err.to_string(),
            ApiError::BadRequest(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.detail());
        }

        let body = json!({
            "error": self.error_code(),
            "detail": self.detail(),
        });
        (status, Json(body)).into_response()
    }
}
