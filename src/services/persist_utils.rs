use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

use crate::database::entities::{datasets, equipment};

const EQUIPMENT_BATCH_SIZE: usize = 500;

/// Insert equipment ActiveModels in manageable batches.
pub async fn insert_equipment_batches<C>(
    conn: &C,
    mut models: Vec<equipment::ActiveModel>,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    while !models.is_empty() {
        let batch_size = EQUIPMENT_BATCH_SIZE.min(models.len());
        let batch: Vec<_> = models.drain(..batch_size).collect();
        equipment::Entity::insert_many(batch).exec(conn).await?;
    }
    Ok(())
}

/// Delete a dataset row and its equipment rows. Returns whether the dataset
/// row still existed; a dataset that is already gone is not an error.
pub async fn delete_dataset_rows<C>(conn: &C, dataset_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    equipment::Entity::delete_many()
        .filter(equipment::Column::DatasetId.eq(dataset_id))
        .exec(conn)
        .await?;

    let result = datasets::Entity::delete_by_id(dataset_id).exec(conn).await?;
    Ok(result.rows_affected > 0)
}
