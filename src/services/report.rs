//! Report projection.
//!
//! A [`ReportView`] is assembled from what was stored at upload time: the
//! persisted summary columns plus the first few equipment rows. Statistics
//! are never recomputed here, so JSON and PDF reports always agree with the
//! upload response.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::dataset_service::OwnedDataset;
use crate::config::ReportConfig;
use crate::database::entities::equipment;
use crate::errors::DatasetResult;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeRow {
    pub equipment_type: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordRow {
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

impl From<equipment::Model> for RecordRow {
    fn from(model: equipment::Model) -> Self {
        Self {
            name: model.name,
            equipment_type: model.equipment_type,
            flowrate: model.flowrate,
            pressure: model.pressure,
            temperature: model.temperature,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportView {
    pub id: i32,
    pub name: String,
    pub original_filename: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_count: usize,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub type_distribution: IndexMap<String, usize>,
    /// Most frequent types first, ties broken by name.
    pub type_rows: Vec<TypeRow>,
    pub records: Vec<RecordRow>,
}

/// Rank types by count (descending) then name, keeping at most `limit`.
pub fn top_types(distribution: &IndexMap<String, usize>, limit: usize) -> Vec<TypeRow> {
    let mut rows: Vec<TypeRow> = distribution
        .iter()
        .map(|(equipment_type, count)| TypeRow {
            equipment_type: equipment_type.clone(),
            count: *count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.equipment_type.cmp(&b.equipment_type))
    });
    rows.truncate(limit);
    rows
}

pub fn assemble(
    owned: &OwnedDataset,
    records: Vec<equipment::Model>,
    config: &ReportConfig,
) -> DatasetResult<ReportView> {
    let dataset = &owned.dataset;
    let type_distribution = dataset.type_distribution()?;

    Ok(ReportView {
        id: dataset.id,
        name: dataset.name.clone(),
        original_filename: dataset.original_filename.clone(),
        uploaded_by: owned.uploaded_by.clone(),
        uploaded_at: dataset.uploaded_at,
        total_count: dataset.total_count.max(0) as usize,
        avg_flowrate: dataset.avg_flowrate,
        avg_pressure: dataset.avg_pressure,
        avg_temperature: dataset.avg_temperature,
        type_rows: top_types(&type_distribution, config.type_limit),
        type_distribution,
        records: records
            .into_iter()
            .take(config.record_limit)
            .map(RecordRow::from)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::datasets;

    fn dataset(distribution: &str) -> OwnedDataset {
        OwnedDataset {
            dataset: datasets::Model {
                id: 7,
                name: "Plant A".to_string(),
                original_filename: "plant.csv".to_string(),
                uploaded_by: 1,
                uploaded_at: Utc::now(),
                file_path: None,
                total_count: 6,
                avg_flowrate: Some(10.5),
                avg_pressure: None,
                avg_temperature: Some(80.0),
                type_distribution: distribution.to_string(),
                preview_rows: "[]".to_string(),
            },
            uploaded_by: "engineer".to_string(),
        }
    }

    fn record(id: i32) -> equipment::Model {
        equipment::Model {
            id,
            dataset_id: 7,
            name: format!("E-{id}"),
            equipment_type: "Pump".to_string(),
            flowrate: Some(1.0),
            pressure: None,
            temperature: Some(2.0),
        }
    }

    #[test]
    fn projects_stored_fields() {
        let report = assemble(
            &dataset(r#"{"Valve":1,"Pump":3,"Mixer":2}"#),
            vec![record(1), record(2)],
            &ReportConfig::default(),
        )
        .unwrap();

        assert_eq!(report.id, 7);
        assert_eq!(report.uploaded_by, "engineer");
        assert_eq!(report.total_count, 6);
        assert_eq!(report.avg_pressure, None);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].name, "E-1");
        let types: Vec<&str> = report
            .type_rows
            .iter()
            .map(|row| row.equipment_type.as_str())
            .collect();
        assert_eq!(types, vec!["Pump", "Mixer", "Valve"]);
    }

    #[test]
    fn limits_types_and_records() {
        let config = ReportConfig {
            type_limit: 2,
            record_limit: 3,
        };
        let report = assemble(
            &dataset(r#"{"B":1,"A":1,"C":1}"#),
            (1..=5).map(record).collect(),
            &config,
        )
        .unwrap();
        assert_eq!(report.records.len(), 3);
        assert_eq!(
            report.type_rows,
            vec![
                TypeRow {
                    equipment_type: "A".to_string(),
                    count: 1
                },
                TypeRow {
                    equipment_type: "B".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn corrupt_distribution_is_an_error() {
        let result = assemble(&dataset("not json"), vec![], &ReportConfig::default());
        assert!(result.is_err());
    }
}
