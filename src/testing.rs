//! Workbook fixtures for unit tests.

use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use rust_xlsxwriter::Url;
use rust_xlsxwriter::Workbook;
use rust_xlsxwriter::Worksheet;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub(crate) const CATALOG: &str = "目录";

/// Saves the workbook to memory and opens it for reading.
pub(crate) fn open(workbook: &mut Workbook) -> XlsxSpreadsheet {
    let bytes = workbook.save_to_buffer().expect("save fixture workbook");
    XlsxSpreadsheet::from_bytes("fixture.xlsx", bytes).expect("open fixture workbook")
}

/// Adds the catalog sheet with one internal hyperlink per `(row, col, target, label)`.
/// Positions are 0-based; the label goes into the next column.
pub(crate) fn add_catalog(workbook: &mut Workbook, links: &[(u32, u16, &str, &str)]) {
    let sheet = workbook.add_worksheet().set_name(CATALOG).expect("catalog name");
    sheet.write_string(0, 0, "Index").expect("title");
    for (row, col, target, label) in links {
        sheet
            .write_url(*row, *col, Url::new(format!("internal:{target}!A1")).set_text(*target))
            .expect("link cell");
        if !label.is_empty() {
            sheet.write_string(*row, *col + 1, *label).expect("label cell");
        }
    }
}

/// Adds a target sheet with two header rows and `rows` starting at row 3.
/// Columns start at A; numeric-looking values are written as numbers, empty
/// strings leave the cell blank.
pub(crate) fn add_data_sheet(workbook: &mut Workbook, name: &str, rows: &[&[&str]]) {
    let sheet = workbook.add_worksheet().set_name(name).expect("sheet name");
    sheet.write_string(0, 0, format!("{name} report")).expect("title row");
    sheet.write_string(1, 1, "Code").expect("header row");
    for (offset, row) in rows.iter().enumerate() {
        write_row(sheet, 2 + offset as u32, row);
    }
}

fn write_row(sheet: &mut Worksheet, row: u32, values: &[&str]) {
    for (col, value) in values.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        match value.parse::<f64>() {
            Ok(number) => sheet.write_number(row, col as u16, number),
            Err(_) => sheet.write_string(row, col as u16, *value),
        }
        .expect("data cell");
    }
}

/// Builds a minimal xlsx package from raw worksheet XML bodies.
pub(crate) fn package(sheets: &[(&str, &str)], shared_strings: Option<&str>) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut workbook = String::from(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut relationships = String::from(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (index, (name, body)) in sheets.iter().enumerate() {
        let id = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
        ));
        writer
            .start_file(format!("xl/worksheets/sheet{id}.xml"), options)
            .expect("sheet part");
        writer
            .write_all(format!(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{body}</worksheet>"#).as_bytes())
            .expect("sheet xml");
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");

    writer.start_file("xl/workbook.xml", options).expect("workbook part");
    writer.write_all(workbook.as_bytes()).expect("workbook xml");
    writer
        .start_file("xl/_rels/workbook.xml.rels", options)
        .expect("relationships part");
    writer.write_all(relationships.as_bytes()).expect("relationships xml");
    if let Some(shared_strings) = shared_strings {
        writer.start_file("xl/sharedStrings.xml", options).expect("shared strings part");
        writer.write_all(shared_strings.as_bytes()).expect("shared strings xml");
    }
    writer.finish().expect("finish package").into_inner()
}
