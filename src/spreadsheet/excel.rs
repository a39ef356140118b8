//! Office Open XML package helpers shared by the xlsx reader
use crate::error::CatalogMergeError;
use crate::helpers::reader::WorkbookSource;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use zip::ZipArchive;

/// XML tag name for relationship elements
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Opens the zip container of a workbook.
///
/// Encrypted workbooks are stored as OLE compound documents, as are legacy
/// `.xls` files; both are rejected before zip parsing.
pub(super) fn open(file_name: &str, mut source: WorkbookSource) -> Result<ZipArchive<WorkbookSource>, CatalogMergeError> {
    if source.is_compound_document()? {
        Err(SpreadsheetError::CompoundDocumentError(file_name.to_owned()))?;
    }
    Ok(ZipArchive::new(source)?)
}

/// Loads worksheet relationships of the workbook part.
///
/// # Returns
/// Mapping of relationship IDs to worksheet part paths
pub(super) fn load_relationships(zip: &mut ZipArchive<WorkbookSource>, path: &str) -> Result<HashMap<String, String>, CatalogMergeError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Chartsheets and dialog sheets carry no cell data
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Maps the `numFmtId` of every cell style to a cell type.
///
/// # Arguments
/// * `format_indexes` - `numFmtId` of each `cellXfs` entry, in style index order
/// * `custom_formats` - Custom formats declared in `numFmts`
/// * `is_1904` - Whether the workbook uses the 1904 date system
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to a path inside the package
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}
