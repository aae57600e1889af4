use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::app::AppState;
use super::error::ApiError;
use crate::database::entities::users;
use crate::errors::AuthError;

/// The caller resolved from an `Authorization: Token <key>` (or
/// `Bearer <key>`) header.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: users::Model,
    pub token: String,
}

pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        Some(token.to_string())
    } else {
        None
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AuthError::MissingToken)?;
        let user = state.auth.authenticate(&token).await?;
        Ok(AuthUser { user, token })
    }
}
