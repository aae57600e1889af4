//! Row validation and type coercion.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::columns::{CanonicalHeader, ColumnMap};
use super::reader::{RawRow, RawTable};
use crate::errors::{IngestError, IngestResult};

/// Type assigned to rows whose `type` cell is blank.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Cell values treated the same as an empty cell.
static MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A row after coercion. All five canonical fields are always present;
/// numeric cells that were blank or unparseable are `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CleanRow {
    pub equipment_name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

impl CleanRow {
    pub fn numeric(&self, header: CanonicalHeader) -> Option<f64> {
        match header {
            CanonicalHeader::Flowrate => self.flowrate,
            CanonicalHeader::Pressure => self.pressure,
            CanonicalHeader::Temperature => self.temperature,
            CanonicalHeader::EquipmentName | CanonicalHeader::Type => None,
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|value| !MISSING_MARKERS.contains(value))
}

fn coerce_number(value: Option<&str>) -> Option<f64> {
    present(value)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|number| number.is_finite())
}

fn cell<'a>(row: &'a RawRow, columns: &ColumnMap, header: CanonicalHeader) -> Option<&'a str> {
    columns.position(header).and_then(|index| row.get(index))
}

fn clean_row(row: &RawRow, columns: &ColumnMap) -> Option<CleanRow> {
    let all_blank = CanonicalHeader::ALL
        .iter()
        .all(|header| present(cell(row, columns, *header)).is_none());
    if all_blank {
        return None;
    }

    Some(CleanRow {
        equipment_name: present(cell(row, columns, CanonicalHeader::EquipmentName))
            .unwrap_or_default()
            .to_string(),
        equipment_type: present(cell(row, columns, CanonicalHeader::Type))
            .unwrap_or(UNKNOWN_TYPE)
            .to_string(),
        flowrate: coerce_number(cell(row, columns, CanonicalHeader::Flowrate)),
        pressure: coerce_number(cell(row, columns, CanonicalHeader::Pressure)),
        temperature: coerce_number(cell(row, columns, CanonicalHeader::Temperature)),
    })
}

/// Validate the header set and coerce every row, preserving input order.
///
/// Fails with [`IngestError::EmptyInput`] when there are no data rows,
/// [`IngestError::Schema`] when a canonical column is missing, and
/// [`IngestError::NoValidData`] when every row is blank in all five columns.
pub fn clean(table: &RawTable) -> IngestResult<Vec<CleanRow>> {
    if table.rows.is_empty() {
        return Err(IngestError::EmptyInput);
    }

    let columns = ColumnMap::from_headers(&table.headers);
    let missing = columns.missing();
    if !missing.is_empty() {
        return Err(IngestError::Schema { missing });
    }

    let cleaned: Vec<CleanRow> = table
        .rows
        .iter()
        .filter_map(|row| clean_row(row, &columns))
        .collect();

    debug!(
        input_rows = table.rows.len(),
        kept_rows = cleaned.len(),
        "Cleaned CSV rows"
    );

    if cleaned.is_empty() {
        return Err(IngestError::NoValidData);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: [&str; 5] = ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            HEADERS,
            rows.iter().map(|cells| RawRow::new(cells.iter().copied())).collect(),
        )
    }

    #[test]
    fn coerces_all_fields() {
        let rows = clean(&table(&[&["  Pump-001 ", " Pump", "100.5", "2", "-3e1"]])).unwrap();
        assert_eq!(
            rows,
            vec![CleanRow {
                equipment_name: "Pump-001".to_string(),
                equipment_type: "Pump".to_string(),
                flowrate: Some(100.5),
                pressure: Some(2.0),
                temperature: Some(-30.0),
            }]
        );
    }

    #[test]
    fn drops_only_fully_blank_rows() {
        let rows = clean(&table(&[
            &["Pump-001", "Pump", "100", "", "80"],
            &["", " ", "", "", ""],
            &["Valve-001", "Valve", "50", "1", "60"],
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pressure, None);
        assert_eq!(rows[1].equipment_name, "Valve-001");
    }

    #[test]
    fn missing_markers_count_as_blank() {
        let rows = clean(&table(&[
            &["NA", "null", "N/A", "NaN", ""],
            &["Pump-001", "n/a", "nan", "1", "2"],
        ]))
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].equipment_type, UNKNOWN_TYPE);
        assert_eq!(rows[0].flowrate, None);
    }

    #[test]
    fn unparseable_numbers_become_null() {
        let rows = clean(&table(&[&["Pump-001", "Pump", "fast", "inf", "12abc"]])).unwrap();
        assert_eq!(rows[0].flowrate, None);
        assert_eq!(rows[0].pressure, None);
        assert_eq!(rows[0].temperature, None);
    }

    #[test]
    fn blank_type_and_name_get_defaults() {
        let rows = clean(&table(&[&["", "", "1", "2", "3"]])).unwrap();
        assert_eq!(rows[0].equipment_name, "");
        assert_eq!(rows[0].equipment_type, UNKNOWN_TYPE);
    }

    #[test]
    fn short_rows_are_kept_with_nulls() {
        let rows = clean(&table(&[&["Pump-001", "Pump"]])).unwrap();
        assert_eq!(rows[0].flowrate, None);
        assert_eq!(rows[0].temperature, None);
    }

    #[test]
    fn empty_input_is_rejected_before_schema() {
        let err = clean(&RawTable::new(["Name"], vec![])).unwrap_err();
        assert!(matches!(err, IngestError::EmptyInput));
    }

    #[test]
    fn missing_columns_are_listed() {
        let raw = RawTable::new(
            ["Equipment Name", "Type", "Flowrate", "Pressure"],
            vec![RawRow::new(["Pump-001", "Pump", "1", "2"])],
        );
        let err = clean(&raw).unwrap_err();
        assert_eq!(err.to_string(), "Missing required columns: Temperature");
    }

    #[test]
    fn all_blank_rows_is_no_valid_data() {
        let err = clean(&table(&[&["", "", "", "", ""], &[" ", "", "", "", ""]])).unwrap_err();
        assert!(matches!(err, IngestError::NoValidData));
    }

    #[test]
    fn headers_resolve_in_any_order_and_spelling() {
        let raw = RawTable::new(
            ["temp", "FLOW RATE", "equipment type", " pressure ", "Name", "Notes"],
            vec![RawRow::new(["80", "100", "Pump", "2", "Pump-001", "ignored"])],
        );
        let rows = clean(&raw).unwrap();
        assert_eq!(rows[0].equipment_name, "Pump-001");
        assert_eq!(rows[0].equipment_type, "Pump");
        assert_eq!(rows[0].flowrate, Some(100.0));
        assert_eq!(rows[0].pressure, Some(2.0));
        assert_eq!(rows[0].temperature, Some(80.0));
    }

    #[test]
    fn serializes_with_canonical_keys() {
        let row = CleanRow {
            equipment_name: "P".to_string(),
            equipment_type: "Pump".to_string(),
            flowrate: None,
            pressure: Some(1.5),
            temperature: None,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "equipment_name": "P",
                "type": "Pump",
                "flowrate": null,
                "pressure": 1.5,
                "temperature": null
            })
        );
    }
}
