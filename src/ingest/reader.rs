//! Decoding and CSV parsing of raw upload bytes.

use csv::{ReaderBuilder, StringRecord};
use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::errors::IngestResult;

const UTF8_BOM: &str = "\u{feff}";

/// One parsed CSV line. Cells are positional and line up with
/// [`RawTable::headers`]; cells past the end of a short line are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<&StringRecord> for RawRow {
    fn from(record: &StringRecord) -> Self {
        RawRow::new(record.iter())
    }
}

/// Header row plus data rows, exactly as they appeared in the file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>, rows: Vec<RawRow>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows,
        }
    }
}

/// Decode upload bytes to text. UTF-8 is tried first (a leading byte order
/// mark is dropped); anything else is read as Windows-1252, which accepts
/// every byte sequence.
pub fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string(),
        Err(_) => {
            debug!("Upload is not valid UTF-8, decoding as Windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Parse CSV text into a [`RawTable`]. Lines with fewer or more cells than
/// the header are accepted.
pub fn parse(content: &str) -> IngestResult<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RawRow::from(&record));
    }

    Ok(RawTable { headers, rows })
}

/// Decode then parse.
pub fn read_table(bytes: &[u8]) -> IngestResult<RawTable> {
    parse(&decode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_rows() {
        let table = parse("a,b\n1,2\n3,4\n").expect("valid csv");
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].get(0), Some("3"));
    }

    #[test]
    fn short_rows_leave_trailing_cells_absent() {
        let table = parse("a,b,c\n1\n").expect("valid csv");
        assert_eq!(table.rows[0].len(), 1);
        assert_eq!(table.rows[0].get(2), None);
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let table = parse("a,b\n").expect("valid csv");
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn quoted_cells_keep_commas() {
        let table = parse("name,type\n\"Pump, North\",Pump\n").expect("valid csv");
        assert_eq!(table.rows[0].get(0), Some("Pump, North"));
    }

    #[test]
    fn bom_is_stripped() {
        let text = decode("\u{feff}Equipment Name,Type\n".as_bytes());
        assert!(text.starts_with("Equipment Name"));
    }

    #[test]
    fn latin1_bytes_fall_back_to_windows_1252() {
        let bytes = b"name\nCaf\xe9\n";
        let table = read_table(bytes).expect("decodable");
        assert_eq!(table.rows[0].get(0), Some("Café"));
    }
}
