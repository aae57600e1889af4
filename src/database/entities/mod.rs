pub mod auth_tokens;
pub mod datasets;
pub mod equipment;
pub mod users;
