use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ingest::CleanRow;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "equipment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    pub name: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::datasets::Entity",
        from = "Column::DatasetId",
        to = "super::datasets::Column::Id",
        on_delete = "Cascade"
    )]
    Datasets,
}

impl Related<super::datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Datasets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn from_clean_row(dataset_id: i32, row: &CleanRow) -> Self {
        use sea_orm::Set;

        Self {
            dataset_id: Set(dataset_id),
            name: Set(row.equipment_name.clone()),
            equipment_type: Set(row.equipment_type.clone()),
            flowrate: Set(row.flowrate),
            pressure: Set(row.pressure),
            temperature: Set(row.temperature),
            ..Default::default()
        }
    }
}
