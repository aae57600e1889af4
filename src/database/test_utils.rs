use sea_orm::{Database, DatabaseConnection};

/// In-memory SQLite database with all migrations applied.
///
/// The pool is capped at one connection: every new `:memory:` connection
/// would otherwise see its own empty database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut opt = sea_orm::ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1);
    let db = Database::connect(opt)
        .await
        .expect("Failed to connect to test database");

    super::setup_database(&db)
        .await
        .expect("Failed to run migrations");

    db
}
