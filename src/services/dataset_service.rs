use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::path::Path;
use tracing::{info, warn};

use super::blob_store::BlobStore;
use super::persist_utils::{delete_dataset_rows, insert_equipment_batches};
use super::report::{self, ReportView};
use super::retention::RetentionManager;
use crate::config::{AppConfig, IngestConfig, ReportConfig};
use crate::database::entities::{datasets, equipment, users};
use crate::errors::{DatasetError, DatasetResult};
use crate::ingest::{self, Analysis};

/// A file received from a client, not yet validated.
#[derive(Clone, Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Display name; a timestamped default is used when blank.
    pub name: Option<String>,
    pub uploaded_by: i32,
}

/// A stored dataset together with the username of its uploader.
#[derive(Clone, Debug)]
pub struct OwnedDataset {
    pub dataset: datasets::Model,
    pub uploaded_by: String,
}

impl OwnedDataset {
    fn from_pair((dataset, user): (datasets::Model, Option<users::Model>)) -> Self {
        Self {
            dataset,
            uploaded_by: user.map(|user| user.username).unwrap_or_default(),
        }
    }
}

/// Upload, read-back and deletion of datasets.
#[derive(Clone)]
pub struct DatasetService {
    db: DatabaseConnection,
    blobs: BlobStore,
    retention: RetentionManager,
    ingest: IngestConfig,
    report: ReportConfig,
}

pub fn default_dataset_name() -> String {
    format!("Dataset {}", Utc::now().format("%Y-%m-%d %H:%M"))
}

impl DatasetService {
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        let blobs = BlobStore::new(config.storage.upload_dir.clone());
        let retention =
            RetentionManager::new(db.clone(), blobs.clone(), config.retention.keep_last);
        Self {
            db,
            blobs,
            retention,
            ingest: config.ingest.clone(),
            report: config.report.clone(),
        }
    }

    pub fn retention(&self) -> &RetentionManager {
        &self.retention
    }

    /// Validate, analyse and persist an upload. The retention policy is
    /// applied in the same transaction as the insert, so either the new
    /// dataset is stored and older ones beyond the limit are gone, or
    /// nothing changes.
    pub async fn create_from_upload(&self, upload: Upload) -> DatasetResult<datasets::Model> {
        let size = upload.bytes.len() as u64;
        let analysis = ingest::check_upload(&upload.file_name, size, &self.ingest).and_then(|_| {
            ingest::analyze(&upload.bytes, &self.ingest).map_err(DatasetError::from)
        });
        let Analysis { rows, summary } = match analysis {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(
                    code = err.error_code(),
                    "Rejected upload {}: {}", upload.file_name, err
                );
                return Err(err);
            }
        };

        let name = upload
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(default_dataset_name);

        let file_path = self.blobs.save(&upload.bytes).await?;

        let dataset = datasets::ActiveModel {
            name: Set(name),
            original_filename: Set(upload.file_name.clone()),
            uploaded_by: Set(upload.uploaded_by),
            uploaded_at: Set(Utc::now()),
            file_path: Set(Some(file_path.to_string_lossy().into_owned())),
            total_count: Set(summary.total_count as i32),
            avg_flowrate: Set(summary.avg_flowrate),
            avg_pressure: Set(summary.avg_pressure),
            avg_temperature: Set(summary.avg_temperature),
            type_distribution: Set(serde_json::to_string(&summary.type_distribution)?),
            preview_rows: Set(serde_json::to_string(&summary.preview_rows)?),
            ..Default::default()
        };

        let (created, pruned) = match self.persist(dataset, &rows).await {
            Ok(persisted) => persisted,
            Err(err) => {
                if let Err(cleanup) = self.blobs.remove(&file_path).await {
                    warn!("Failed to remove blob {}: {}", file_path.display(), cleanup);
                }
                return Err(err);
            }
        };

        info!(
            dataset_id = created.id,
            total_count = created.total_count,
            "Created dataset '{}' from {}",
            created.name,
            created.original_filename
        );

        self.retention.remove_blobs(&pruned).await;
        Ok(created)
    }

    async fn persist(
        &self,
        dataset: datasets::ActiveModel,
        rows: &[ingest::CleanRow],
    ) -> DatasetResult<(datasets::Model, Vec<datasets::Model>)> {
        let txn = self.db.begin().await?;
        let created = dataset.insert(&txn).await?;

        let records = rows
            .iter()
            .map(|row| equipment::ActiveModel::from_clean_row(created.id, row))
            .collect();
        insert_equipment_batches(&txn, records).await?;
        let pruned = self.retention.prune_rows(&txn).await?;

        txn.commit().await?;
        Ok((created, pruned))
    }

    /// Most recent datasets first.
    pub async fn list_recent(&self, limit: usize) -> DatasetResult<Vec<OwnedDataset>> {
        let datasets = datasets::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(datasets::Column::UploadedAt)
            .order_by_desc(datasets::Column::Id)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        Ok(datasets.into_iter().map(OwnedDataset::from_pair).collect())
    }

    pub async fn get(&self, id: i32) -> DatasetResult<OwnedDataset> {
        datasets::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await?
            .map(OwnedDataset::from_pair)
            .ok_or(DatasetError::NotFound(id))
    }

    /// Equipment rows of a dataset in insertion order.
    pub async fn equipment_records(
        &self,
        dataset_id: i32,
        limit: Option<usize>,
    ) -> DatasetResult<Vec<equipment::Model>> {
        let mut query = equipment::Entity::find()
            .filter(equipment::Column::DatasetId.eq(dataset_id))
            .order_by_asc(equipment::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit as u64);
        }
        Ok(query.all(&self.db).await?)
    }

    /// Report projection built from the stored summary; nothing is
    /// recomputed from equipment rows.
    pub async fn report(&self, id: i32) -> DatasetResult<ReportView> {
        let owned = self.get(id).await?;
        let records = self
            .equipment_records(id, Some(self.report.record_limit))
            .await?;
        report::assemble(&owned, records, &self.report)
    }

    /// Delete a dataset, its equipment rows and its blob.
    pub async fn delete(&self, id: i32) -> DatasetResult<()> {
        let dataset = datasets::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DatasetError::NotFound(id))?;

        if let Some(file_path) = dataset.file_path.as_deref() {
            if let Err(err) = self.blobs.remove(Path::new(file_path)).await {
                warn!(dataset_id = id, "Failed to remove blob {}: {}", file_path, err);
            }
        }

        let txn = self.db.begin().await?;
        delete_dataset_rows(&txn, id).await?;
        txn.commit().await?;

        info!(dataset_id = id, "Deleted dataset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::IngestError;
    use crate::services::auth_service::AuthService;
    use sea_orm::ConnectionTrait;

    const SAMPLE: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
Pump-001,Pump,100.0,2.0,80.0\n\
Pump-002,Pump,200.0,,90.0\n\
,,,,\n\
Valve-001,Valve,50.0,1.0,60.0\n";

    async fn setup() -> (DatasetService, i32, tempfile::TempDir) {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.upload_dir = dir.path().join("uploads");

        let user = AuthService::new(db.clone())
            .register("engineer", "", "correct-horse")
            .await
            .unwrap();
        (DatasetService::new(db, &config), user.user_id, dir)
    }

    fn upload(user: i32, file_name: &str, content: &str) -> Upload {
        Upload {
            file_name: file_name.to_string(),
            bytes: content.as_bytes().to_vec(),
            name: None,
            uploaded_by: user,
        }
    }

    #[tokio::test]
    async fn creates_dataset_with_records_and_blob() {
        let (service, user, _dir) = setup().await;
        let created = service
            .create_from_upload(upload(user, "plant.csv", SAMPLE))
            .await
            .unwrap();

        assert_eq!(created.total_count, 3);
        assert!(created.name.starts_with("Dataset "));
        let summary = created.summary().unwrap();
        assert_eq!(summary.preview_rows.len(), 3);
        assert_eq!(summary.preview_rows[1].pressure, None);
        assert_eq!(summary.avg_pressure, Some(1.5));

        let records = service.equipment_records(created.id, None).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].name, "Valve-001");

        let blob = created.file_path.clone().unwrap();
        assert!(Path::new(&blob).exists());

        let owned = service.get(created.id).await.unwrap();
        assert_eq!(owned.uploaded_by, "engineer");
    }

    #[tokio::test]
    async fn rejected_upload_persists_nothing() {
        let (service, user, dir) = setup().await;
        let err = service
            .create_from_upload(upload(
                user,
                "plant.csv",
                "Equipment Name,Type,Flowrate,Pressure\nP,Pump,1,2\n",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Ingest(IngestError::Schema { .. })));
        assert!(service.list_recent(10).await.unwrap().is_empty());
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected_before_parsing() {
        let (service, user, _dir) = setup().await;
        let err = service
            .create_from_upload(upload(user, "plant.txt", "not,a,csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedFileType(_)));
    }

    #[tokio::test]
    async fn keeps_only_the_five_most_recent() {
        let (service, user, _dir) = setup().await;
        let mut created = Vec::new();
        for i in 0..6 {
            let mut request = upload(user, "plant.csv", SAMPLE);
            request.name = Some(format!("upload {i}"));
            created.push(service.create_from_upload(request).await.unwrap());
        }

        let remaining = service.list_recent(10).await.unwrap();
        assert_eq!(remaining.len(), 5);
        assert!(remaining.iter().all(|owned| owned.dataset.id != created[0].id));
        assert_eq!(remaining[0].dataset.name, "upload 5");

        let evicted_blob = created[0].file_path.clone().unwrap();
        assert!(!Path::new(&evicted_blob).exists());
        assert!(service
            .equipment_records(created[0].id, None)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            service.get(created[0].id).await,
            Err(DatasetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn prune_tolerates_missing_blobs() {
        let (service, user, _dir) = setup().await;
        let mut first = None;
        for _ in 0..5 {
            let created = service
                .create_from_upload(upload(user, "plant.csv", SAMPLE))
                .await
                .unwrap();
            first.get_or_insert(created);
        }
        let first = first.unwrap();
        std::fs::remove_file(first.file_path.as_ref().unwrap()).unwrap();

        service
            .create_from_upload(upload(user, "plant.csv", SAMPLE))
            .await
            .unwrap();
        assert_eq!(service.list_recent(10).await.unwrap().len(), 5);
        assert!(matches!(
            service.get(first.id).await,
            Err(DatasetError::NotFound(_))
        ));
        assert!(service.retention().prune().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_prune_rolls_back_the_upload() {
        let (service, user, dir) = setup().await;
        let mut created = Vec::new();
        for _ in 0..5 {
            created.push(
                service
                    .create_from_upload(upload(user, "plant.csv", SAMPLE))
                    .await
                    .unwrap(),
            );
        }

        service
            .db
            .execute_unprepared(
                "CREATE TRIGGER block_dataset_delete BEFORE DELETE ON datasets \
                 BEGIN SELECT RAISE(ABORT, 'delete failed'); END",
            )
            .await
            .unwrap();

        let err = service
            .create_from_upload(upload(user, "plant.csv", SAMPLE))
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Database(_)));

        let remaining = service.list_recent(10).await.unwrap();
        assert_eq!(remaining.len(), 5);
        let oldest = service.get(created[0].id).await.unwrap();
        assert_eq!(
            service
                .equipment_records(oldest.dataset.id, None)
                .await
                .unwrap()
                .len(),
            3
        );
        assert!(Path::new(created[0].file_path.as_ref().unwrap()).exists());
        let blobs = std::fs::read_dir(dir.path().join("uploads")).unwrap().count();
        assert_eq!(blobs, 5);
    }

    #[tokio::test]
    async fn prune_reports_only_datasets_it_removed() {
        let (service, user, _dir) = setup().await;
        for _ in 0..5 {
            service
                .create_from_upload(upload(user, "plant.csv", SAMPLE))
                .await
                .unwrap();
        }
        assert!(service.retention().prune().await.unwrap().is_empty());

        let retention = RetentionManager::new(service.db.clone(), service.blobs.clone(), 3);
        let expired = retention.expired(&service.db).await.unwrap();
        assert_eq!(expired.len(), 2);

        // One of the expired datasets disappears before the prune runs
        service.delete(expired[0].id).await.unwrap();
        assert_eq!(retention.prune().await.unwrap(), vec![expired[1].id]);
        assert_eq!(service.list_recent(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn report_reads_stored_summary() {
        let (service, user, _dir) = setup().await;
        let created = service
            .create_from_upload(upload(user, "plant.csv", SAMPLE))
            .await
            .unwrap();

        // Mutating equipment rows must not change the report statistics
        equipment::Entity::delete_many()
            .filter(equipment::Column::DatasetId.eq(created.id))
            .exec(&service.db)
            .await
            .unwrap();

        let report = service.report(created.id).await.unwrap();
        assert_eq!(report.total_count, 3);
        assert_eq!(report.avg_flowrate, Some(116.67));
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn delete_is_not_found_the_second_time() {
        let (service, user, _dir) = setup().await;
        let created = service
            .create_from_upload(upload(user, "plant.csv", SAMPLE))
            .await
            .unwrap();

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.delete(created.id).await,
            Err(DatasetError::NotFound(_))
        ));
    }
}
