use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AuthError;
use crate::server::app::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::ApiError;
use crate::services::AuthSession;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
    #[serde(default)]
    pub password_confirm: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub date_joined: String,
    pub token: String,
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let request = json_body(payload)?;

    if let Some(confirm) = request.password_confirm.as_deref() {
        if confirm != request.password {
            return Err(AuthError::InvalidPassword("Passwords do not match".to_string()).into());
        }
    }

    let session = state
        .auth
        .register(
            &request.username,
            request.email.as_deref().unwrap_or_default(),
            &request.password,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let request = json_body(payload)?;
    let session = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(session))
}

pub async fn logout(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Value>, ApiError> {
    state.auth.logout(&caller.token).await?;
    Ok(Json(json!({ "message": "Logout successful" })))
}

pub async fn profile(caller: AuthUser) -> Json<ProfileResponse> {
    let AuthUser { user, token } = caller;
    Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        date_joined: user.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        token,
    })
}
