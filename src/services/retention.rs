//! "Keep the last N uploads" policy.
//!
//! Recency is the upload timestamp only; reading a dataset never refreshes
//! it. Pruning is authoritative on the database rows and best-effort on the
//! raw blobs: rows are deleted inside the caller's transaction, blobs are
//! removed only after that transaction commits, and a blob that cannot be
//! removed is logged and left behind.

use std::path::Path;

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, TransactionTrait,
};
use tracing::{info, warn};

use super::blob_store::BlobStore;
use super::persist_utils::delete_dataset_rows;
use crate::database::entities::datasets;
use crate::errors::DatasetResult;

#[derive(Clone)]
pub struct RetentionManager {
    db: DatabaseConnection,
    blobs: BlobStore,
    keep_last: usize,
}

impl RetentionManager {
    pub fn new(db: DatabaseConnection, blobs: BlobStore, keep_last: usize) -> Self {
        Self {
            db,
            blobs,
            keep_last,
        }
    }

    pub fn keep_last(&self) -> usize {
        self.keep_last
    }

    /// Datasets ranked beyond `keep_last`, newest first.
    pub async fn expired<C>(&self, conn: &C) -> Result<Vec<datasets::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let ranked = datasets::Entity::find()
            .order_by_desc(datasets::Column::UploadedAt)
            .order_by_desc(datasets::Column::Id)
            .all(conn)
            .await?;
        Ok(ranked.into_iter().skip(self.keep_last).collect())
    }

    /// Delete the rows of every dataset beyond the retention limit using
    /// `conn`, which is normally an open transaction. Returns the datasets
    /// whose rows this call removed; one already deleted by another caller
    /// is skipped. Blobs are untouched, see [`Self::remove_blobs`].
    pub async fn prune_rows<C>(&self, conn: &C) -> Result<Vec<datasets::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut pruned = Vec::new();
        for dataset in self.expired(conn).await? {
            if delete_dataset_rows(conn, dataset.id).await? {
                pruned.push(dataset);
            }
        }
        Ok(pruned)
    }

    /// Remove the blobs of pruned datasets once their rows are committed.
    pub async fn remove_blobs(&self, pruned: &[datasets::Model]) {
        for dataset in pruned {
            if let Some(file_path) = dataset.file_path.as_deref() {
                if let Err(err) = self.blobs.remove(Path::new(file_path)).await {
                    warn!(
                        dataset_id = dataset.id,
                        "Failed to remove blob {}: {}", file_path, err
                    );
                }
            }
            info!(
                dataset_id = dataset.id,
                uploaded_at = %dataset.uploaded_at,
                "Pruned dataset beyond retention limit of {}",
                self.keep_last
            );
        }
    }

    /// Prune in a transaction of its own and return the pruned ids.
    pub async fn prune(&self) -> DatasetResult<Vec<i32>> {
        let txn = self.db.begin().await?;
        let pruned = self.prune_rows(&txn).await?;
        txn.commit().await?;

        self.remove_blobs(&pruned).await;
        Ok(pruned.into_iter().map(|dataset| dataset.id).collect())
    }
}
