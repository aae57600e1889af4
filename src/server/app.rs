use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{auth, datasets, health};
use crate::config::AppConfig;
use crate::services::{AuthService, DatasetService};

/// Room for multipart framing and the `name` field on top of the file cap.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub datasets: DatasetService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            datasets: DatasetService::new(db.clone(), &config),
            auth: AuthService::new(db.clone()),
            config: Arc::new(config),
            db,
        }
    }
}

pub async fn create_app(db: DatabaseConnection, config: AppConfig) -> Result<Router> {
    let cors = match config.server.cors_origin.as_deref() {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin '{}'", origin))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    // Oversize files must reach the upload handler to be reported as 413
    // FILE_TOO_LARGE instead of being cut off by the default 2 MiB limit.
    let body_limit: usize = config
        .ingest
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD)
        .try_into()
        .unwrap_or(usize::MAX);

    let state = AppState::new(db, config);

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile))
        // Dataset routes
        .route("/upload", post(datasets::upload_dataset))
        .route("/datasets", get(datasets::list_datasets))
        .route(
            "/datasets/:id",
            get(datasets::get_dataset).delete(datasets::delete_dataset),
        )
        .route("/datasets/:id/report", get(datasets::dataset_report))
        .route("/datasets/:id/report/pdf", get(datasets::dataset_report_pdf))
}
