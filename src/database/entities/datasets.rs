use indexmap::IndexMap;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ingest::{CleanRow, DatasetSummary};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datasets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub original_filename: String,
    pub uploaded_by: i32,
    pub uploaded_at: ChronoDateTimeUtc,
    /// Raw CSV blob on disk; `None` when the blob was never written.
    pub file_path: Option<String>,
    pub total_count: i32,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub type_distribution: String, // JSON object
    pub preview_rows: String,      // JSON array
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::equipment::Entity")]
    Equipment,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UploadedBy",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::equipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Equipment.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn type_distribution(&self) -> Result<IndexMap<String, usize>, serde_json::Error> {
        serde_json::from_str(&self.type_distribution)
    }

    pub fn preview_rows(&self) -> Result<Vec<CleanRow>, serde_json::Error> {
        serde_json::from_str(&self.preview_rows)
    }

    /// The summary exactly as it was stored at upload time.
    pub fn summary(&self) -> Result<DatasetSummary, serde_json::Error> {
        Ok(DatasetSummary {
            total_count: self.total_count.max(0) as usize,
            avg_flowrate: self.avg_flowrate,
            avg_pressure: self.avg_pressure,
            avg_temperature: self.avg_temperature,
            type_distribution: self.type_distribution()?,
            preview_rows: self.preview_rows()?,
        })
    }
}
