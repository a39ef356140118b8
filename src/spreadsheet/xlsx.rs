use crate::error::CatalogMergeError;
use crate::helpers::reader::WorkbookSource;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::parse_range;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Hyperlink;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cached cell value
const TAG_HYPERLINK: QName = QName(b"hyperlink");     // Hyperlink annotation

/// An xlsx workbook opened for reading.
///
/// Only cached values are read; formulas are never evaluated.
pub struct XlsxSpreadsheet {
    /// File name of the spreadsheet
    name: String,
    /// ZIP archive containing the package parts
    zip: ZipArchive<WorkbookSource>,
    /// Cell type of every cell style, indexed by style ID
    number_formats: Vec<CellType>,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
    /// Shared string table, loaded on first sheet read
    shared_strings: Option<Vec<String>>,
}

impl XlsxSpreadsheet {
    /// Opens an xlsx file and parses its workbook structure and styles.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<XlsxSpreadsheet, CatalogMergeError> {
        let path = path.as_ref();
        let name = path.to_string_lossy().to_string();
        Self::from_source(&name, WorkbookSource::open(path)?)
    }

    /// Opens an xlsx package held in memory; `name` is used in messages only.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<XlsxSpreadsheet, CatalogMergeError> {
        Self::from_source(name, WorkbookSource::from_bytes(bytes))
    }

    fn from_source(name: &str, source: WorkbookSource) -> Result<XlsxSpreadsheet, CatalogMergeError> {
        let mut zip = excel::open(name, source)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(name.to_owned()))?
        }
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        debug!(file = name, sheets = sheets.len(), is_1904, "opened workbook");
        Ok(XlsxSpreadsheet {
            name: name.to_owned(),
            zip,
            number_formats,
            sheets,
            shared_strings: None,
        })
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Parses one worksheet part into a [`Sheet`].
    ///
    /// Shared string references are resolved to their text, numbers are typed
    /// by the number format of their style, and `<hyperlink>` annotations are
    /// collected with their cell ranges.
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, CatalogMergeError> {
        let zip_path = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.to_owned())
            .ok_or_else(|| SpreadsheetError::SheetNotFoundError(self.name.to_owned(), sheet_name.to_owned()))?;
        if self.shared_strings.is_none() {
            self.shared_strings = Some(load_shared_strings(&mut self.zip)?);
        }
        let shared_strings: &[String] = self.shared_strings.as_deref().unwrap_or_default();

        let mut sheet = Sheet::new(&self.name, sheet_name);
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut reader = self
            .zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(reference) = event.get_attribute_value("r")? {
                    row_count = reference.trim().parse::<usize>()?.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
                col_count = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                value.clear();
                kind = match event.get_attribute_value("t")?.as_deref() {
                    Some("inlineStr") | Some("str") => CellType::InlineString,
                    Some("s") => CellType::SharedString,
                    Some("d") => CellType::IsoDateTime,
                    Some("b") => CellType::Boolean,
                    Some("e") => CellType::Error,
                    _ => CellType::Number,
                };
                if kind == CellType::Number {
                    if let Some(style) = event.get_attribute_value("s")? {
                        if !style.is_empty() {
                            let index = style.trim().parse::<usize>()?;
                            kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                        }
                    }
                }
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if !value.is_empty() && event.name() == TAG_CELL => {
                if kind == CellType::SharedString {
                    let index = value.trim().parse::<usize>()?;
                    value = shared_strings.get(index).cloned().ok_or_else(|| {
                        SpreadsheetError::CellValueError(
                            self.name.to_owned(),
                            sheet_name.to_owned(),
                            index_to_reference(row, col),
                            format!("shared string {index} out of range"),
                        )
                    })?;
                }
                // Empty shared strings count as missing cells
                if !value.is_empty() {
                    sheet.push(Cell {
                        row,
                        col,
                        kind,
                        value: std::mem::take(&mut value),
                    });
                }
            }
            Event::Start(event) if event.name() == TAG_HYPERLINK => {
                if let Some((first, last)) = event.get_attribute_value("ref")?.and_then(|range| parse_range(&range)) {
                    sheet.push_hyperlink(Hyperlink {
                        first,
                        last,
                        location: event.get_attribute_value("location")?.map(Cow::into_owned),
                    });
                }
            }
        });

        debug!(
            sheet = sheet_name,
            cells = sheet.cells.len(),
            hyperlinks = sheet.hyperlinks.len(),
            "read worksheet"
        );
        Ok(sheet)
    }
}

/// Loads the whole shared string table; an absent part means no shared strings.
fn load_shared_strings(zip: &mut ZipArchive<WorkbookSource>) -> Result<Vec<String>, CatalogMergeError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Loads worksheet names and part paths from `xl/workbook.xml`,
/// and whether the workbook uses the 1904 date system.
fn load_workbook(zip: &mut ZipArchive<WorkbookSource>) -> Result<(Vec<(String, String)>, bool), CatalogMergeError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads the cell type of every cell style from `xl/styles.xml`.
fn load_number_formats(zip: &mut ZipArchive<WorkbookSource>, is_1904: bool) -> Result<Vec<CellType>, CatalogMergeError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let style = CellType::parse_custom_number_format(&format, is_1904);
                custom_formats.insert(id.to_string(), style);
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => {
            format_indexes_context = false;
        }
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_else(|| "0".to_owned()));
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Reads the text of a string element up to `end_tag`, skipping phonetic runs.
///
/// With `is_text_content` the element's own text is the value (`<v>`);
/// otherwise only `<t>` children contribute (`<si>`, `<is>`, rich text runs).
fn read_string_value(
    reader: &mut XmlReader<BufReader<ZipFile<'_, WorkbookSource>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, CatalogMergeError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::Value;
    use crate::testing;
    use chrono::NaiveDate;
    use rust_xlsxwriter::Format;
    use rust_xlsxwriter::Url;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn reads_sheet_names_in_workbook_order() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("目录").unwrap();
        workbook.add_worksheet().set_name("Sheet2").unwrap();
        let spreadsheet = testing::open(&mut workbook);

        assert_eq!(spreadsheet.sheet_names(), vec!["目录".to_owned(), "Sheet2".to_owned()]);
        assert_eq!(spreadsheet.name(), "fixture.xlsx");
    }

    #[test]
    fn reads_typed_values_and_hyperlinks() {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet().set_name("目录").unwrap();
        sheet.write_url(4, 1, Url::new("internal:Sheet2!A1").set_text("Sheet2")).unwrap();
        sheet.write_string(4, 2, "Report A").unwrap();
        sheet.write_number(5, 1, 12.5).unwrap();
        sheet.write_boolean(5, 2, true).unwrap();
        sheet.write_number_with_format(5, 3, 45_292.0, &date_format).unwrap();
        let mut spreadsheet = testing::open(&mut workbook);

        let sheet = spreadsheet.read_sheet("目录").unwrap();
        assert_eq!(sheet.value(4, 1).unwrap(), Value::Text("Sheet2".to_owned()));
        assert_eq!(sheet.value(4, 2).unwrap(), Value::Text("Report A".to_owned()));
        assert_eq!(sheet.value(5, 1).unwrap(), Value::Number(12.5));
        assert_eq!(sheet.value(5, 2).unwrap(), Value::Boolean(true));
        assert_eq!(
            sheet.value(5, 3).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(sheet.hyperlinks().len(), 1);
        assert_eq!(sheet.hyperlinks()[0].first, crate::spreadsheet::CellRef::new(4, 1));
        assert_eq!(sheet.hyperlinks()[0].location.as_deref(), Some("Sheet2!A1"));
    }

    #[test]
    fn reads_inline_strings_rich_text_errors_and_implicit_positions() {
        let bytes = testing::package(
            &[(
                "Data",
                r#"<sheetData>
                    <row r="3">
                        <c t="inlineStr"><is><t>first</t></is></c>
                        <c t="s"><v>0</v></c>
                        <c t="e"><v>#N/A</v></c>
                        <c t="str"><f>A3&amp;"!"</f><v>first!</v></c>
                    </row>
                    <row><c r="B4" t="s"><v>1</v></c></row>
                </sheetData>"#,
            )],
            Some(r#"<sst><si><r><t>R&amp;</t></r><r><t>D</t></r><rPh><t>ignored</t></rPh></si><si><t></t></si></sst>"#),
        );
        let mut spreadsheet = XlsxSpreadsheet::from_bytes("raw.xlsx", bytes).unwrap();

        let sheet = spreadsheet.read_sheet("Data").unwrap();
        assert_eq!(sheet.value(2, 0).unwrap(), Value::Text("first".to_owned()));
        assert_eq!(sheet.value(2, 1).unwrap(), Value::Text("R&D".to_owned()));
        assert_eq!(sheet.value(2, 2).unwrap(), Value::Error("#N/A".to_owned()));
        assert_eq!(sheet.value(2, 3).unwrap(), Value::Text("first!".to_owned()));
        assert_eq!(sheet.value(3, 1).unwrap(), Value::Empty);
        assert_eq!(sheet.row_count(), 3);
    }

    #[test]
    fn unknown_sheet_is_an_error() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("Sheet1").unwrap();
        let mut spreadsheet = testing::open(&mut workbook);

        let error = spreadsheet.read_sheet("sheet1").err().expect("case-sensitive lookup");
        assert!(matches!(
            error,
            CatalogMergeError::SpreadsheetError(SpreadsheetError::SheetNotFoundError(_, _))
        ));
    }

    #[test]
    fn garbage_input_is_rejected() {
        assert!(XlsxSpreadsheet::from_bytes("broken.xlsx", b"not a zip".to_vec()).is_err());
    }
}
