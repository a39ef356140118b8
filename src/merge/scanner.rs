//! Collects link records from the catalog sheet.

use crate::error::CatalogMergeError;
use crate::error::ResultMessage;
use crate::spreadsheet::CellRef;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::Value;
use std::collections::BTreeMap;
use tracing::debug;
use tracing::info;

/// A hyperlink-annotated catalog cell and the sheet it names.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkRecord {
    /// Position of the annotated cell on the catalog sheet
    pub reference: CellRef,
    /// Displayed text of the annotated cell, read as a worksheet name
    pub target: String,
    /// Value of the cell right of the annotated cell
    pub label: Value,
}

/// Link records keyed by catalog cell, iterated in row-major scan order.
pub type LinkMap = BTreeMap<CellRef, LinkRecord>;

/// Scans the catalog sheet for hyperlink-annotated cells.
///
/// A workbook without the catalog sheet yields no links.
pub fn scan_catalog<S>(spreadsheet: &mut S, catalog_sheet: &str) -> Result<LinkMap, CatalogMergeError>
where
    S: Spreadsheet + ?Sized,
{
    if !spreadsheet.sheet_names().iter().any(|name| name == catalog_sheet) {
        info!(catalog = catalog_sheet, "catalog sheet not found, nothing to merge");
        return Ok(LinkMap::new());
    }
    let sheet = spreadsheet
        .read_sheet(catalog_sheet)
        .with_prefix(&format!("Read catalog sheet '{catalog_sheet}' failed"))?;
    info!(catalog = catalog_sheet, "scanning catalog sheet for linked sheet names");
    scan_sheet(&sheet)
}

/// Builds one link record per annotated cell of an already parsed sheet.
pub fn scan_sheet(sheet: &Sheet) -> Result<LinkMap, CatalogMergeError> {
    let mut links = LinkMap::new();
    for reference in sheet.hyperlinked_cells() {
        let target = sheet.value(reference.row, reference.col)?.to_string();
        let label_cell = reference.next_in_row();
        let label = sheet.value(label_cell.row, label_cell.col)?;
        let location = sheet
            .hyperlinks()
            .iter()
            .find(|hyperlink| hyperlink.contains(reference))
            .and_then(|hyperlink| hyperlink.location.as_deref())
            .unwrap_or_default();
        debug!(cell = %reference, sheet = %target, label = %label, location, "found link");
        links.insert(
            reference,
            LinkRecord {
                reference,
                target,
                label,
            },
        );
    }
    Ok(links)
}
