//! # Spreadsheet Reading Module
//!
//! Reads xlsx workbooks (`.xlsx`, `.xlsm`, `.xltx`, `.xltm`) into [`Sheet`]s:
//! cached cell values typed by their number format, plus the hyperlink
//! annotations of each worksheet.
use crate::error::CatalogMergeError;
use thiserror::Error;

pub(crate) mod cell;
pub(crate) mod excel;
pub mod reference;
pub(crate) mod sheet;
pub mod xlsx;

pub(crate) use crate::spreadsheet::cell::Cell;
pub use crate::spreadsheet::cell::Value;
pub use crate::spreadsheet::reference::CellRef;
pub use crate::spreadsheet::sheet::Hyperlink;
pub use crate::spreadsheet::sheet::Sheet;

/// Errors raised while reading a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// A required package part is missing
    #[error("Missing package part '{0}'")]
    FileError(String),

    /// Encrypted workbook or legacy binary file
    #[error("'{0}' is an OLE compound document (encrypted workbook or legacy xls), not an xlsx package")]
    CompoundDocumentError(String),

    /// The workbook declares no worksheets
    #[error("Spreadsheet '{0}' contains no worksheets")]
    SpreadsheetEmptyError(String),

    /// No worksheet with the requested name
    #[error("Worksheet '{1}' not found in '{0}'")]
    SheetNotFoundError(String, String),

    /// A cached value that cannot be decoded for its cell type
    #[error("Invalid cell value in '{0}', sheet '{1}', cell {2}: {3}")]
    CellValueError(String, String, String, String),
}

/// A workbook whose worksheets can be listed and read by name.
pub trait Spreadsheet {
    /// File name the workbook was opened from
    fn name(&self) -> String;

    /// Worksheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads all cells and hyperlinks of the named worksheet (exact name match)
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, CatalogMergeError>;
}
