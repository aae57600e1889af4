//! Summary statistics over cleaned rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::cleaner::CleanRow;
use super::columns::CanonicalHeader;

/// Default number of rows kept in [`DatasetSummary::preview_rows`].
pub const DEFAULT_PREVIEW_LIMIT: usize = 100;

/// Statistics computed once at upload time and stored with the dataset.
///
/// `type_distribution` keeps types in order of first appearance so the
/// serialized form of a summary is stable for a given input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_count: usize,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub type_distribution: IndexMap<String, usize>,
    pub preview_rows: Vec<CleanRow>,
}

/// Round half away from zero to two decimal places. Values too large to
/// scale have no fractional part and are returned unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Mean of the non-null values of a numeric column, or `None` if there are none.
///
/// The mean is updated incrementally so it stays finite for any finite input.
pub fn column_average(rows: &[CleanRow], header: CanonicalHeader) -> Option<f64> {
    let (mean, count) = rows
        .iter()
        .filter_map(|row| row.numeric(header))
        .fold((0.0_f64, 0_usize), |(mean, count), value| {
            let count = count + 1;
            (mean + (value - mean) / count as f64, count)
        });

    if count == 0 {
        None
    } else {
        Some(round2(mean))
    }
}

pub fn type_distribution(rows: &[CleanRow]) -> IndexMap<String, usize> {
    let mut distribution = IndexMap::new();
    for row in rows {
        *distribution.entry(row.equipment_type.clone()).or_insert(0) += 1;
    }
    distribution
}

/// Compute the summary for a set of cleaned rows. Pure: the same rows always
/// yield the same summary.
pub fn aggregate(rows: &[CleanRow], preview_limit: usize) -> DatasetSummary {
    DatasetSummary {
        total_count: rows.len(),
        avg_flowrate: column_average(rows, CanonicalHeader::Flowrate),
        avg_pressure: column_average(rows, CanonicalHeader::Pressure),
        avg_temperature: column_average(rows, CanonicalHeader::Temperature),
        type_distribution: type_distribution(rows),
        preview_rows: rows.iter().take(preview_limit).cloned().collect(),
    }
}
