//! Reads the column window of a target sheet's data rows.

use crate::error::CatalogMergeError;
use crate::merge::scanner::LinkRecord;
use crate::merge::LinkError;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Value;

/// First data row (0-based); rows 1 and 2 are headers.
pub const FIRST_DATA_ROW: usize = 2;
/// Column whose empty value ends the data (0-based, column B).
pub const SENTINEL_COL: usize = 1;
/// First column of the window (0-based, column B).
pub const WINDOW_FIRST_COL: usize = 1;
/// Number of columns in the window (B..=G).
pub const WINDOW_WIDTH: usize = 6;

/// The six values of columns B..=G of one data row.
pub type ColumnWindow = [Value; WINDOW_WIDTH];

/// Resolves a link's target identifier to a worksheet name.
///
/// The name must match exactly; names that are empty, padded with whitespace,
/// or that match several worksheets when case is ignored are rejected.
pub fn resolve_target(sheet_names: &[String], link: &LinkRecord) -> Result<String, LinkError> {
    let target = link.target.as_str();
    if target.is_empty() {
        return Err(LinkError::EmptyTarget(link.reference));
    }
    if target.trim() != target {
        return Err(LinkError::UntrimmedTarget(target.to_owned()));
    }
    let candidates: Vec<&String> = sheet_names
        .iter()
        .filter(|name| name.to_lowercase() == target.to_lowercase())
        .collect();
    if !candidates.iter().any(|name| name.as_str() == target) {
        return Err(LinkError::SheetNotFound(target.to_owned()));
    }
    if candidates.len() > 1 {
        let names: Vec<&str> = candidates.iter().map(|name| name.as_str()).collect();
        return Err(LinkError::AmbiguousTarget(target.to_owned(), names.join(", ")));
    }
    Ok(target.to_owned())
}

/// Opens the sheet named by `link` and returns its data rows.
pub fn extract_rows<S>(spreadsheet: &mut S, link: &LinkRecord) -> Result<RowWindows, CatalogMergeError>
where
    S: Spreadsheet + ?Sized,
{
    let name = resolve_target(&spreadsheet.sheet_names(), link)?;
    let sheet = spreadsheet.read_sheet(&name)?;
    Ok(RowWindows::new(sheet))
}

/// Column windows of a target sheet from row 3 up to, not including, the
/// first row with an empty column B.
///
/// Rows are decoded one at a time; iteration ends after the first error.
pub struct RowWindows {
    sheet: Sheet,
    row: usize,
    finished: bool,
}

impl RowWindows {
    pub fn new(sheet: Sheet) -> Self {
        Self {
            sheet,
            row: FIRST_DATA_ROW,
            finished: false,
        }
    }

    /// 1-based number of the row the next window comes from.
    pub fn next_row_number(&self) -> usize {
        self.row + 1
    }

    fn read_row(&self, row: usize) -> Result<Option<ColumnWindow>, SpreadsheetError> {
        if self.sheet.value(row, SENTINEL_COL)?.is_empty() {
            return Ok(None);
        }
        let mut window = ColumnWindow::default();
        for (offset, slot) in window.iter_mut().enumerate() {
            *slot = self.sheet.value(row, WINDOW_FIRST_COL + offset)?;
        }
        Ok(Some(window))
    }
}

impl Iterator for RowWindows {
    type Item = Result<ColumnWindow, SpreadsheetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.read_row(self.row);
        match result {
            Ok(Some(_)) => self.row += 1,
            Ok(None) | Err(_) => self.finished = true,
        }
        result.transpose()
    }
}
