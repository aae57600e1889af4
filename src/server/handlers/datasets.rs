use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::database::entities::datasets;
use crate::errors::{DatasetError, DatasetResult};
use crate::export::to_pdf;
use crate::ingest::{self, CleanRow};
use crate::server::app::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::ApiError;
use crate::services::{OwnedDataset, ReportView, Upload};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub id: i32,
    pub name: String,
    pub original_filename: String,
    pub uploaded_by: String,
    pub uploaded_at: String,
    pub total_count: i32,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub type_distribution: IndexMap<String, usize>,
}

impl DatasetResponse {
    fn from_model(dataset: &datasets::Model, uploaded_by: String) -> DatasetResult<Self> {
        Ok(Self {
            id: dataset.id,
            name: dataset.name.clone(),
            original_filename: dataset.original_filename.clone(),
            uploaded_by,
            uploaded_at: dataset.uploaded_at.format(TIMESTAMP_FORMAT).to_string(),
            total_count: dataset.total_count,
            avg_flowrate: dataset.avg_flowrate,
            avg_pressure: dataset.avg_pressure,
            avg_temperature: dataset.avg_temperature,
            type_distribution: dataset.type_distribution()?,
        })
    }
}

impl TryFrom<&OwnedDataset> for DatasetResponse {
    type Error = DatasetError;

    fn try_from(owned: &OwnedDataset) -> DatasetResult<Self> {
        Self::from_model(&owned.dataset, owned.uploaded_by.clone())
    }
}

/// Single-dataset view; adds the stored preview rows.
#[derive(Debug, Serialize)]
pub struct DatasetDetailResponse {
    #[serde(flatten)]
    pub dataset: DatasetResponse,
    pub preview_rows: Vec<CleanRow>,
}

impl DatasetDetailResponse {
    fn from_model(dataset: &datasets::Model, uploaded_by: String) -> DatasetResult<Self> {
        Ok(Self {
            dataset: DatasetResponse::from_model(dataset, uploaded_by)?,
            preview_rows: dataset.preview_rows()?,
        })
    }
}

/// Read a file field chunk by chunk, failing as soon as it grows past
/// `limit`.
async fn read_file(mut field: Field<'_>, limit: u64) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(DatasetError::FileTooLarge {
                    size: bytes.len() as u64,
                    limit,
                }
                .into());
            }
            Err(err) => return Err(ApiError::BadRequest(err.body_text())),
        };
        bytes.extend_from_slice(&chunk);
        if bytes.len() as u64 > limit {
            return Err(DatasetError::FileTooLarge {
                size: bytes.len() as u64,
                limit,
            }
            .into());
        }
    }
    Ok(bytes)
}

pub async fn upload_dataset(
    State(state): State<AppState>,
    caller: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DatasetDetailResponse>), ApiError> {
    let ingest_config = &state.config.ingest;
    let mut name: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.body_text()))?
    {
        let key = field.name().unwrap_or("").to_string();
        match key.as_str() {
            "name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.body_text()))?;
                name = Some(value);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                ingest::check_upload(&file_name, 0, ingest_config)?;
                let bytes = read_file(field, ingest_config.max_upload_bytes).await?;
                file = Some((file_name, bytes));
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or(DatasetError::MissingFile)?;
    info!(
        user = %caller.user.username,
        size = bytes.len(),
        "Received upload {}",
        file_name
    );

    let created = state
        .datasets
        .create_from_upload(Upload {
            file_name,
            bytes,
            name,
            uploaded_by: caller.user.id,
        })
        .await?;

    let response = DatasetDetailResponse::from_model(&created, caller.user.username)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_datasets(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Result<Json<Vec<DatasetResponse>>, ApiError> {
    let datasets = state
        .datasets
        .list_recent(state.config.retention.keep_last)
        .await?;
    let response = datasets
        .iter()
        .map(DatasetResponse::try_from)
        .collect::<DatasetResult<Vec<_>>>()?;
    Ok(Json(response))
}

pub async fn get_dataset(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<DatasetDetailResponse>, ApiError> {
    let owned = state.datasets.get(id).await?;
    let response = DatasetDetailResponse::from_model(&owned.dataset, owned.uploaded_by)?;
    Ok(Json(response))
}

pub async fn delete_dataset(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    state.datasets.delete(id).await?;
    Ok(Json(json!({ "message": format!("Dataset {} deleted", id) })))
}

pub async fn dataset_report(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ReportView>, ApiError> {
    Ok(Json(state.datasets.report(id).await?))
}

pub async fn dataset_report_pdf(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.datasets.report(id).await?;
    let bytes = to_pdf::render(&report, Utc::now())?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    let disposition = format!("attachment; filename=\"{}\"", to_pdf::file_name(&report));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| DatasetError::ExportFailed(e.to_string()))?,
    );

    Ok((headers, bytes))
}
