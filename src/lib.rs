//! # Catalog Merge
//!
//! Reads the catalog sheet (`目录`) of an xlsx workbook, follows every
//! hyperlink-annotated cell to the worksheet named by the cell's text, copies
//! the fixed column window (columns B..G) of that worksheet's data rows and
//! appends them, prefixed with the link's target and label, to a new workbook.
//!
//! ## Pipeline
//!
//! - [`merge::scanner`]: collects link records from the catalog sheet
//! - [`merge::extractor`]: reads the column window of each target sheet until
//!   the first row with an empty second column
//! - [`merge::transformer`]: prepends target and label to each window
//! - [`merge::writer`]: appends output rows and saves the output workbook
//!
//! Failures local to one link are logged and skipped; failures opening the
//! input or saving the output abort the run.

pub mod error;
mod helpers;
pub mod merge;
pub mod spreadsheet;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::error::CatalogMergeError;
pub use crate::merge::{merge, run, MergeConfig, MergeSummary};
pub use crate::spreadsheet::xlsx::XlsxSpreadsheet;
pub use crate::spreadsheet::Spreadsheet;
