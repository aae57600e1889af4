//! CSV ingestion pipeline: bytes → [`RawTable`] → [`CleanRow`]s → [`DatasetSummary`].
//!
//! Everything in this module is synchronous and free of IO so it can run
//! inside a request handler or from the command line alike.

pub mod cleaner;
pub mod columns;
pub mod reader;
pub mod stats;

pub use cleaner::{clean, CleanRow, UNKNOWN_TYPE};
pub use columns::{normalize, CanonicalHeader, ColumnMap, NormalizedHeader};
pub use reader::{read_table, RawRow, RawTable};
pub use stats::{aggregate, DatasetSummary, DEFAULT_PREVIEW_LIMIT};

use tracing::info;

use crate::config::IngestConfig;
use crate::errors::{DatasetError, DatasetResult, IngestResult};

/// Output of a successful pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    /// Every row that survived cleaning, in input order.
    pub rows: Vec<CleanRow>,
    pub summary: DatasetSummary,
}

/// Run parse → clean → aggregate over the raw bytes of a CSV file.
pub fn analyze(bytes: &[u8], config: &IngestConfig) -> IngestResult<Analysis> {
    let table = read_table(bytes)?;
    let rows = clean(&table)?;
    let summary = aggregate(&rows, config.preview_limit);
    info!(
        total_count = summary.total_count,
        types = summary.type_distribution.len(),
        "Analysed equipment CSV"
    );
    Ok(Analysis { rows, summary })
}

const CSV_SUFFIX: &str = ".csv";

/// Reject uploads by name and size before any content is read.
pub fn check_upload(file_name: &str, size: u64, config: &IngestConfig) -> DatasetResult<()> {
    let is_csv = file_name
        .len()
        .checked_sub(CSV_SUFFIX.len())
        .and_then(|start| file_name.get(start..))
        .map(|suffix| suffix.eq_ignore_ascii_case(CSV_SUFFIX))
        .unwrap_or(false);
    if !is_csv {
        return Err(DatasetError::UnsupportedFileType(file_name.to_string()));
    }

    if size > config.max_upload_bytes {
        return Err(DatasetError::FileTooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}
