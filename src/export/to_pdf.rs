//! PDF rendering of a [`ReportView`].
//!
//! Uses the standard Helvetica fonts so no font data needs embedding. Text
//! is WinAnsi-encoded; characters Windows-1252 cannot represent are
//! replaced with `?`.

use chrono::{DateTime, Utc};
use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::errors::{DatasetError, DatasetResult};
use crate::services::report::ReportView;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const LINE_HEIGHT: i64 = 16;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

pub fn format_value(value: Option<f64>) -> String {
    value
        .map(|value| format!("{:.2}", value))
        .unwrap_or_else(|| "N/A".to_string())
}

fn or_na(text: &str) -> &str {
    if text.is_empty() {
        "N/A"
    } else {
        text
    }
}

fn encode_text(text: &str) -> Vec<u8> {
    let (encoded, _, had_errors) = WINDOWS_1252.encode(text);
    if !had_errors {
        return encoded.into_owned();
    }

    let mut buf = [0u8; 4];
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let (encoded, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if unmappable {
            out.push(b'?');
        } else {
            out.extend_from_slice(&encoded);
        }
    }
    out
}

/// Accumulates drawing operations, starting a new page when the cursor
/// reaches the bottom margin.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // pages is never empty
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn ensure_space(&mut self, height: i64) {
        if self.y - height < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text_at(&mut self, x: i64, size: i64, font: &str, text: &str) {
        let y = self.y;
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
        ));
        ops.push(Operation::new(
            "Td",
            vec![Object::Integer(x), Object::Integer(y)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_text(text))],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn rule(&mut self) {
        let y = self.y - 4;
        let ops = self.ops();
        ops.push(Operation::new("w", vec![Object::Integer(1)]));
        ops.push(Operation::new(
            "m",
            vec![Object::Integer(MARGIN), Object::Integer(y)],
        ));
        ops.push(Operation::new(
            "l",
            vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(y)],
        ));
        ops.push(Operation::new("S", vec![]));
    }

    fn line(&mut self, size: i64, font: &str, text: &str) {
        self.ensure_space(LINE_HEIGHT);
        self.text_at(MARGIN, size, font, text);
        self.y -= LINE_HEIGHT;
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(LINE_HEIGHT * 3);
        self.y -= LINE_HEIGHT / 2;
        self.text_at(MARGIN, 14, BOLD, text);
        self.rule();
        self.y -= LINE_HEIGHT + 4;
    }

    fn row(&mut self, columns: &[i64], cells: &[&str], font: &str) {
        self.ensure_space(LINE_HEIGHT);
        for (x, cell) in columns.iter().zip(cells) {
            self.text_at(MARGIN + x, 10, font, cell);
        }
        self.y -= LINE_HEIGHT;
    }

    fn table(&mut self, columns: &[i64], header: &[&str], rows: &[Vec<String>]) {
        self.row(columns, header, BOLD);
        for row in rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            self.row(columns, &cells, REGULAR);
        }
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT;
    }
}

fn layout(report: &ReportView, generated_at: DateTime<Utc>) -> PageWriter {
    let mut writer = PageWriter::new();

    writer.text_at(MARGIN, 18, BOLD, "Chemical Equipment Dataset Report");
    writer.y -= LINE_HEIGHT * 2;

    writer.heading("Dataset Information");
    let info = [
        ("Dataset Name:", report.name.clone()),
        (
            "Upload Date:",
            report.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        ("Original Filename:", or_na(&report.original_filename).to_string()),
        ("Uploaded By:", or_na(&report.uploaded_by).to_string()),
    ];
    for (label, value) in &info {
        writer.row(&[0, 150], &[label, value], REGULAR);
    }
    writer.gap();

    writer.heading("Summary Statistics");
    let summary = vec![
        vec!["Total Equipment Count".to_string(), report.total_count.to_string()],
        vec!["Average Flowrate".to_string(), format_value(report.avg_flowrate)],
        vec!["Average Pressure".to_string(), format_value(report.avg_pressure)],
        vec!["Average Temperature".to_string(), format_value(report.avg_temperature)],
    ];
    writer.table(&[0, 220], &["Metric", "Value"], &summary);
    writer.gap();

    if !report.type_rows.is_empty() {
        writer.heading("Equipment Type Distribution");
        let types: Vec<Vec<String>> = report
            .type_rows
            .iter()
            .map(|row| vec![row.equipment_type.clone(), row.count.to_string()])
            .collect();
        writer.table(&[0, 220], &["Equipment Type", "Count"], &types);
        writer.gap();
    }

    if !report.records.is_empty() {
        writer.heading(&format!(
            "Sample Equipment Records (First {})",
            report.records.len()
        ));
        let records: Vec<Vec<String>> = report
            .records
            .iter()
            .map(|record| {
                vec![
                    or_na(&record.name).to_string(),
                    or_na(&record.equipment_type).to_string(),
                    format_value(record.flowrate),
                    format_value(record.pressure),
                    format_value(record.temperature),
                ]
            })
            .collect();
        writer.table(
            &[0, 150, 260, 335, 410],
            &["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"],
            &records,
        );
        writer.gap();
    }

    writer.line(
        9,
        REGULAR,
        &format!(
            "Report generated on {}",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
    );
    writer
}

fn font(document: &mut Document, base_font: &str) -> ObjectId {
    document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Render the report to PDF bytes.
pub fn render(report: &ReportView, generated_at: DateTime<Utc>) -> DatasetResult<Vec<u8>> {
    let writer = layout(report, generated_at);

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let regular = font(&mut document, "Helvetica");
    let bold = font(&mut document, "Helvetica-Bold");
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular,
            BOLD => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(writer.pages.len());
    for operations in writer.pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| DatasetError::ExportFailed(e.to_string()))?;
        let content_id = document.add_object(Stream::new(dictionary! {}, content));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.compress();

    let mut bytes = Vec::new();
    document.save_to(&mut bytes)?;
    Ok(bytes)
}

pub fn file_name(report: &ReportView) -> String {
    format!("dataset_{}_report.pdf", report.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::report::{RecordRow, TypeRow};
    use indexmap::IndexMap;

    fn report(type_rows: usize) -> ReportView {
        ReportView {
            id: 3,
            name: "Plant Ä".to_string(),
            original_filename: "plant.csv".to_string(),
            uploaded_by: "engineer".to_string(),
            uploaded_at: Utc::now(),
            total_count: 2,
            avg_flowrate: Some(116.666),
            avg_pressure: None,
            avg_temperature: Some(76.67),
            type_distribution: IndexMap::new(),
            type_rows: (0..type_rows)
                .map(|i| TypeRow {
                    equipment_type: format!("Type {i} \u{2603}"),
                    count: 1,
                })
                .collect(),
            records: vec![RecordRow {
                name: "Pump-001".to_string(),
                equipment_type: "Pump".to_string(),
                flowrate: Some(100.0),
                pressure: None,
                temperature: Some(80.0),
            }],
        }
    }

    #[test]
    fn formats_optional_values() {
        assert_eq!(format_value(Some(116.666)), "116.67");
        assert_eq!(format_value(None), "N/A");
    }

    #[test]
    fn renders_a_loadable_pdf() {
        let bytes = render(&report(2), Utc::now()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let document = Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), 1);
    }

    #[test]
    fn long_tables_flow_onto_more_pages() {
        let bytes = render(&report(120), Utc::now()).unwrap();
        let document = Document::load_mem(&bytes).unwrap();
        assert!(document.get_pages().len() > 1);
    }

    #[test]
    fn text_is_windows_1252_encoded() {
        assert_eq!(encode_text("Plant Ä"), b"Plant \xC4".to_vec());
        assert_eq!(
            encode_text("€5 \u{2013} \u{201C}hot\u{201D}"),
            vec![0x80, b'5', b' ', 0x96, b' ', 0x93, b'h', b'o', b't', 0x94]
        );
        assert_eq!(encode_text("\u{0080}"), b"?".to_vec());
        assert_eq!(encode_text("Pump \u{6CF5}"), b"Pump ?".to_vec());
    }

    #[test]
    fn file_name_uses_dataset_id() {
        assert_eq!(file_name(&report(0)), "dataset_3_report.pdf");
    }
}
