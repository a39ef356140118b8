//! Catalog-driven merge pipeline: scan, extract, transform, write.

pub mod extractor;
pub mod scanner;
pub mod transformer;
pub mod writer;

use crate::error::CatalogMergeError;
use crate::error::ResultMessage;
use crate::merge::extractor::extract_rows;
use crate::merge::scanner::scan_catalog;
use crate::merge::scanner::LinkRecord;
use crate::merge::transformer::transform;
use crate::merge::writer::OutputWriter;
use crate::spreadsheet::CellRef;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub const DEFAULT_CATALOG_SHEET: &str = "目录";
pub const DEFAULT_INPUT: &str = "example_input.xlsx";
pub const DEFAULT_OUTPUT: &str = "processed_example.xlsx";

/// Failures that skip a single link.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Link at {0} has no target sheet name")]
    EmptyTarget(CellRef),

    #[error("Target sheet name '{0}' has leading or trailing whitespace")]
    UntrimmedTarget(String),

    #[error("Target sheet name '{0}' is ambiguous, candidates: {1}")]
    AmbiguousTarget(String, String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),
}

/// Input, output and catalog sheet of one run.
#[derive(Clone, Debug)]
pub struct MergeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub catalog_sheet: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            catalog_sheet: DEFAULT_CATALOG_SHEET.to_owned(),
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Link records found on the catalog sheet
    pub links: usize,
    /// Links whose rows were all appended
    pub merged_links: usize,
    /// Links skipped after an error
    pub failed_links: usize,
    /// Rows appended to the output
    pub rows: usize,
}

/// Appends the rows of every linked sheet to `writer`, in catalog order.
///
/// Errors of a single link are logged and counted; rows already appended for
/// that link stay in the output.
pub fn merge<S>(
    spreadsheet: &mut S,
    catalog_sheet: &str,
    writer: &mut OutputWriter,
) -> Result<MergeSummary, CatalogMergeError>
where
    S: Spreadsheet + ?Sized,
{
    let links = scan_catalog(spreadsheet, catalog_sheet)?;
    let mut summary = MergeSummary {
        links: links.len(),
        ..MergeSummary::default()
    };

    for link in links.values() {
        info!(cell = %link.reference, sheet = %link.target, "opening linked sheet");
        match merge_link(spreadsheet, link, writer) {
            Ok(rows) => {
                debug!(sheet = %link.target, rows, "merged linked sheet");
                summary.merged_links += 1;
            }
            Err(e) => {
                warn!(cell = %link.reference, sheet = %link.target, error = %e, "skipping link");
                summary.failed_links += 1;
            }
        }
    }

    summary.rows = writer.row_count();
    Ok(summary)
}

fn merge_link<S>(spreadsheet: &mut S, link: &LinkRecord, writer: &mut OutputWriter) -> Result<usize, CatalogMergeError>
where
    S: Spreadsheet + ?Sized,
{
    let mut rows = extract_rows(spreadsheet, link)?;
    let mut count = 0;
    loop {
        let row_number = rows.next_row_number();
        let Some(window) = rows.next() else {
            break;
        };
        let output = transform(window?, link);
        info!(sheet = %link.target, row = row_number, values = %output, "appending row");
        writer.append(&output)?;
        count += 1;
    }
    Ok(count)
}

/// Reads `config.input`, merges all linked sheets and saves `config.output`.
pub fn run(config: &MergeConfig) -> Result<MergeSummary, CatalogMergeError> {
    info!(input = %config.input.display(), "reading workbook");
    let mut spreadsheet = XlsxSpreadsheet::open(&config.input)
        .with_prefix(&format!("Open input workbook '{}' failed", config.input.display()))?;
    let mut writer = OutputWriter::new();
    let summary = merge(&mut spreadsheet, &config.catalog_sheet, &mut writer)?;
    writer
        .save(&config.output)
        .with_prefix(&format!("Save output workbook '{}' failed", config.output.display()))?;
    info!(
        output = %config.output.display(),
        links = summary.links,
        merged = summary.merged_links,
        failed = summary.failed_links,
        rows = summary.rows,
        "merge finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::Value;
    use crate::testing;
    use rust_xlsxwriter::Workbook;

    fn read_output(writer: OutputWriter) -> Vec<Vec<Value>> {
        let bytes = writer.save_to_buffer().unwrap();
        let mut output = XlsxSpreadsheet::from_bytes("output.xlsx", bytes).unwrap();
        let name = output.sheet_names().remove(0);
        let sheet = output.read_sheet(&name).unwrap();
        (0..sheet.row_count())
            .map(|row| (0..8).map(|col| sheet.value(row, col).unwrap()).collect())
            .collect()
    }

    fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    #[test]
    fn merges_linked_sheets_in_catalog_order() {
        let mut workbook = Workbook::new();
        testing::add_catalog(
            &mut workbook,
            &[(4, 1, "Sheet2", "Report A"), (6, 1, "Missing", "Report X"), (7, 1, "Sheet3", "Report B")],
        );
        testing::add_data_sheet(
            &mut workbook,
            "Sheet2",
            &[&["1", "A-1", "7"], &["2", "A-2"], &["3", "A-3"], &["4", ""], &["5", "A-5"]],
        );
        testing::add_data_sheet(&mut workbook, "Sheet3", &[&["1", "B-1", "", "", "", "", "last"]]);
        let mut spreadsheet = testing::open(&mut workbook);
        let mut writer = OutputWriter::new();

        let summary = merge(&mut spreadsheet, testing::CATALOG, &mut writer).unwrap();
        assert_eq!(
            summary,
            MergeSummary {
                links: 3,
                merged_links: 2,
                failed_links: 1,
                rows: 4,
            }
        );

        let rows = read_output(writer);
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            vec![
                text("Sheet2"),
                text("Report A"),
                text("A-1"),
                Value::Number(7.0),
                Value::Empty,
                Value::Empty,
                Value::Empty,
                Value::Empty,
            ]
        );
        assert_eq!(rows[2][2], text("A-3"));
        assert_eq!(rows[3][0], text("Sheet3"));
        assert_eq!(rows[3][1], text("Report B"));
        assert_eq!(rows[3][7], text("last"));
    }

    #[test]
    fn missing_catalog_produces_empty_output() {
        let mut workbook = Workbook::new();
        testing::add_data_sheet(&mut workbook, "Sheet2", &[&["1", "A-1"]]);
        let mut spreadsheet = testing::open(&mut workbook);
        let mut writer = OutputWriter::new();

        let summary = merge(&mut spreadsheet, testing::CATALOG, &mut writer).unwrap();
        assert_eq!(summary, MergeSummary::default());
        assert!(read_output(writer).is_empty());
    }

    #[test]
    fn rows_before_a_decode_error_are_kept() {
        let bytes = testing::package(
            &[
                (
                    testing::CATALOG,
                    r#"<sheetData><row r="2"><c r="B2" t="inlineStr"><is><t>Data</t></is></c></row></sheetData>
                       <hyperlinks><hyperlink ref="B2" location="Data!A1"/></hyperlinks>"#,
                ),
                (
                    "Data",
                    r#"<sheetData>
                        <row r="3"><c r="B3" t="inlineStr"><is><t>A-1</t></is></c></row>
                        <row r="4"><c r="B4"><v>broken</v></c></row>
                    </sheetData>"#,
                ),
            ],
            None,
        );
        let mut spreadsheet = XlsxSpreadsheet::from_bytes("raw.xlsx", bytes).unwrap();
        let mut writer = OutputWriter::new();

        let summary = merge(&mut spreadsheet, testing::CATALOG, &mut writer).unwrap();
        assert_eq!(summary.failed_links, 1);
        assert_eq!(summary.rows, 1);
        let rows = read_output(writer);
        assert_eq!(rows[0][0], text("Data"));
        assert_eq!(rows[0][1], Value::Empty);
        assert_eq!(rows[0][2], text("A-1"));
    }

    #[test]
    fn rejected_row_does_not_leak_into_next_link() {
        let too_long = "x".repeat(40_000);
        let bad_sheet = format!(
            r#"<sheetData><row r="3">
                <c r="B3" t="inlineStr"><is><t>BAD-1</t></is></c>
                <c r="C3" t="inlineStr"><is><t>{too_long}</t></is></c>
            </row></sheetData>"#
        );
        let bytes = testing::package(
            &[
                (
                    testing::CATALOG,
                    r#"<sheetData>
                        <row r="2">
                            <c r="B2" t="inlineStr"><is><t>Bad</t></is></c>
                            <c r="C2" t="inlineStr"><is><t>Label Bad</t></is></c>
                        </row>
                        <row r="3"><c r="B3" t="inlineStr"><is><t>Good</t></is></c></row>
                    </sheetData>
                    <hyperlinks>
                        <hyperlink ref="B2" location="Bad!A1"/>
                        <hyperlink ref="B3" location="Good!A1"/>
                    </hyperlinks>"#,
                ),
                ("Bad", bad_sheet.as_str()),
                (
                    "Good",
                    r#"<sheetData><row r="3"><c r="B3" t="inlineStr"><is><t>G-1</t></is></c></row></sheetData>"#,
                ),
            ],
            None,
        );
        let mut spreadsheet = XlsxSpreadsheet::from_bytes("raw.xlsx", bytes).unwrap();
        let mut writer = OutputWriter::new();

        let summary = merge(&mut spreadsheet, testing::CATALOG, &mut writer).unwrap();
        assert_eq!(
            summary,
            MergeSummary {
                links: 2,
                merged_links: 1,
                failed_links: 1,
                rows: 1,
            }
        );
        let rows = read_output(writer);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            vec![
                text("Good"),
                Value::Empty,
                text("G-1"),
                Value::Empty,
                Value::Empty,
                Value::Empty,
                Value::Empty,
                Value::Empty,
            ]
        );
    }

    #[test]
    fn missing_input_is_fatal() {
        let config = MergeConfig {
            input: PathBuf::from("does-not-exist.xlsx"),
            ..MergeConfig::default()
        };
        let error = run(&config).unwrap_err();
        assert!(error.to_string().starts_with("Open input workbook 'does-not-exist.xlsx' failed"));
    }
}
