use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::database::entities::{auth_tokens, users};
use crate::errors::{AuthError, AuthResult};

/// Token handed back to clients after register/login.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub username: String,
    #[serde(skip)]
    pub user_id: i32,
}

/// Thin token gate: users with bcrypt-hashed passwords and one opaque
/// token per user.
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(password: &str) -> AuthResult<String> {
        if password.len() < 8 {
            return Err(AuthError::InvalidPassword(
                "Password must be at least 8 characters long".to_string(),
            ));
        }

        hash(password, DEFAULT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
        verify(password, hash).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Validate username format
    pub fn validate_username(username: &str) -> AuthResult<()> {
        if username.len() < 3 {
            return Err(AuthError::InvalidUsername(
                "Username must be at least 3 characters long".to_string(),
            ));
        }

        if username.len() > 150 {
            return Err(AuthError::InvalidUsername(
                "Username is too long (max 150 characters)".to_string(),
            ));
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '.' | '+' | '-'))
        {
            return Err(AuthError::InvalidUsername(
                "Username can only contain letters, numbers and @/./+/-/_".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<AuthSession> {
        let username = username.trim();
        Self::validate_username(username)?;
        let password_hash = Self::hash_password(password)?;

        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let user = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.trim().to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AuthError::UserAlreadyExists,
            _ => AuthError::Database(err),
        })?;

        info!(user_id = user.id, "Registered user {}", user.username);
        self.session_for(user).await
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthResult<AuthSession> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !Self::verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.session_for(user).await
    }

    /// Delete the caller's token. Logging out twice is not an error.
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        auth_tokens::Entity::delete_by_id(token.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Resolve a token to its user.
    pub async fn authenticate(&self, token: &str) -> AuthResult<users::Model> {
        let (_, user) = auth_tokens::Entity::find_by_id(token.to_string())
            .find_also_related(users::Entity)
            .one(&self.db)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        user.ok_or(AuthError::InvalidToken)
    }

    /// Reuse the user's token, creating one if none exists.
    async fn session_for(&self, user: users::Model) -> AuthResult<AuthSession> {
        let existing = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user.id))
            .one(&self.db)
            .await?;

        let token = match existing {
            Some(token) => token.key,
            None => {
                auth_tokens::ActiveModel {
                    key: Set(Uuid::new_v4().simple().to_string()),
                    user_id: Set(user.id),
                    created_at: Set(Utc::now()),
                }
                .insert(&self.db)
                .await?
                .key
            }
        };

        Ok(AuthSession {
            token,
            username: user.username,
            user_id: user.id,
        })
    }
}
