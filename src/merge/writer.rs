//! Output workbook: one sheet, rows appended in processing order, no header.

use crate::error::CatalogMergeError;
use crate::merge::transformer::OutputRow;
use crate::spreadsheet::Value;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::debug;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const TIME_FORMAT: &str = "h:mm:ss";
const DATETIME_FORMAT: &str = "yyyy-mm-dd h:mm:ss";

/// Accumulates output rows in memory until [`OutputWriter::save`].
pub struct OutputWriter {
    workbook: Workbook,
    next_row: u32,
    date_format: Format,
    time_format: Format,
    datetime_format: Format,
}

impl OutputWriter {
    /// Creates a workbook with a single empty worksheet.
    pub fn new() -> Self {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        Self {
            workbook,
            next_row: 0,
            date_format: Format::new().set_num_format(DATE_FORMAT),
            time_format: Format::new().set_num_format(TIME_FORMAT),
            datetime_format: Format::new().set_num_format(DATETIME_FORMAT),
        }
    }

    /// Number of rows appended so far.
    pub fn row_count(&self) -> usize {
        self.next_row as usize
    }

    /// Writes `row` below the previously appended rows; empty values stay blank.
    ///
    /// A row is written whole or not at all: when a value is rejected, the
    /// cells already written for it are cleared and the row index is reused.
    pub fn append(&mut self, row: &OutputRow) -> Result<(), CatalogMergeError> {
        let row_index = self.next_row;
        let sheet = self.workbook.worksheet_from_index(0)?;
        for (col, value) in row.values().iter().enumerate() {
            let col = col as u16;
            let written = match value {
                Value::Empty => Ok(sheet.clear_cell(row_index, col)),
                Value::Text(text) | Value::Error(text) => sheet.write_string(row_index, col, text),
                Value::Number(number) => sheet.write_number(row_index, col, *number),
                Value::Boolean(boolean) => sheet.write_boolean(row_index, col, *boolean),
                Value::Date(date) => sheet.write_datetime_with_format(row_index, col, date, &self.date_format),
                Value::Time(time) => sheet.write_datetime_with_format(row_index, col, time, &self.time_format),
                Value::DateTime(datetime) => {
                    sheet.write_datetime_with_format(row_index, col, datetime, &self.datetime_format)
                }
            }
            .map(|_| ());
            if let Err(e) = written {
                for written_col in 0..col {
                    sheet.clear_cell(row_index, written_col);
                }
                return Err(e.into());
            }
        }
        self.next_row += 1;
        Ok(())
    }

    /// Persists the workbook to `path`.
    pub fn save(mut self, path: &Path) -> Result<(), CatalogMergeError> {
        self.workbook.save(path)?;
        debug!(path = %path.display(), rows = self.next_row, "saved output workbook");
        Ok(())
    }

    /// Serializes the workbook to xlsx bytes.
    pub fn save_to_buffer(mut self) -> Result<Vec<u8>, CatalogMergeError> {
        Ok(self.workbook.save_to_buffer()?)
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new()
    }
}
