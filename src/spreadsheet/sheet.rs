use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::Value;
use crate::spreadsheet::reference::CellRef;
use crate::spreadsheet::SpreadsheetError;
use std::collections::BTreeSet;
use std::collections::HashMap;

/// A hyperlink annotation covering a rectangular range of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Hyperlink {
    /// Top-left cell of the annotated range
    pub first: CellRef,
    /// Bottom-right cell of the annotated range (inclusive)
    pub last: CellRef,
    /// In-workbook location such as `Sheet2!A1`, if any
    pub location: Option<String>,
}

impl Hyperlink {
    pub fn contains(&self, cell: CellRef) -> bool {
        self.first.row <= cell.row
            && cell.row <= self.last.row
            && self.first.col <= cell.col
            && cell.col <= self.last.col
    }
}

/// Represents one worksheet with its populated cells and hyperlink annotations.
pub struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// All populated cells in document order
    pub(crate) cells: Vec<Cell>,
    /// Index mapping from (row, col) to position in `cells`
    indexes: HashMap<(usize, usize), usize>,
    /// Hyperlink annotations in document order
    pub(crate) hyperlinks: Vec<Hyperlink>,
    /// Actual data range (determined from cell data)
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            indexes: HashMap::new(),
            hyperlinks: Vec::new(),
            row_upper_bound: None,
            col_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell; a later cell at the same position replaces the earlier one.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.row_upper_bound = self.row_upper_bound.max(Some(cell.row));
        self.col_upper_bound = self.col_upper_bound.max(Some(cell.col));
        match self.indexes.get(&(cell.row, cell.col)) {
            Some(index) => self.cells[*index] = cell,
            None => {
                self.indexes.insert((cell.row, cell.col), self.cells.len());
                self.cells.push(cell);
            }
        }
    }

    pub(crate) fn push_hyperlink(&mut self, hyperlink: Hyperlink) {
        self.hyperlinks.push(hyperlink);
    }

    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    /// Number of rows up to and including the last populated row.
    pub fn row_count(&self) -> usize {
        self.row_upper_bound.map(|row| row + 1).unwrap_or(0)
    }

    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.indexes
            .get(&(row, col))
            .and_then(|index| self.cells.get(*index))
    }

    /// Typed value of the cell at (row, col); missing cells are [`Value::Empty`].
    pub fn value(&self, row: usize, col: usize) -> Result<Value, SpreadsheetError> {
        match self.get(row, col) {
            Some(cell) => cell.to_value().map_err(|message| {
                SpreadsheetError::CellValueError(
                    self.file_name.to_owned(),
                    self.name.to_owned(),
                    cell.reference(),
                    message,
                )
            }),
            None => Ok(Value::Empty),
        }
    }

    /// Cells carrying a hyperlink annotation, in row-major order.
    ///
    /// Every cell of an annotated range inside the used area of the sheet
    /// counts; the top-left cell of a range always counts, populated or not.
    pub fn hyperlinked_cells(&self) -> BTreeSet<CellRef> {
        let mut cells = BTreeSet::new();
        for hyperlink in &self.hyperlinks {
            cells.insert(hyperlink.first);
            let row_upper = self.row_upper_bound.map_or(hyperlink.first.row, |row| row.min(hyperlink.last.row));
            let col_upper = self.col_upper_bound.map_or(hyperlink.first.col, |col| col.min(hyperlink.last.col));
            for row in hyperlink.first.row..=row_upper {
                for col in hyperlink.first.col..=col_upper {
                    cells.insert(CellRef::new(row, col));
                }
            }
        }
        cells
    }
}
