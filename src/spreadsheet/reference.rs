//! A1-style cell references.

use std::fmt;

/// Zero-based (row, column) position of a cell.
///
/// Ordering is row-major, which is the order cells are visited when a sheet is
/// scanned row by row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The cell immediately to the right.
    pub const fn next_in_row(&self) -> Self {
        Self::new(self.row, self.col + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&index_to_reference(self.row, self.col))
    }
}

/// Converts 0-based row and column indexes to a reference such as `B5`.
pub fn index_to_reference(row: usize, col: usize) -> String {
    let mut column = col + 1;
    let mut letters = Vec::<u8>::new();
    while column > 0 {
        column -= 1;
        letters.push(b'A' + (column % 26) as u8);
        column /= 26;
    }
    letters.reverse();
    let mut reference = String::from_utf8(letters).unwrap_or_default();
    reference.push_str(&(row + 1).to_string());
    reference
}

/// Parses a reference such as `B5` or `$B$5` into 0-based (row, column) indexes.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim();
    let mut col = 0usize;
    let mut letters = 0usize;
    let mut digits = String::new();
    for character in reference.chars().filter(|character| *character != '$') {
        match character {
            'A'..='Z' | 'a'..='z' if digits.is_empty() => {
                col = col * 26 + (character.to_ascii_uppercase() as usize - 'A' as usize + 1);
                letters += 1;
                if letters > 3 {
                    return None;
                }
            }
            '0'..='9' if letters > 0 => digits.push(character),
            _ => return None,
        }
    }
    let row = digits.parse::<usize>().ok().filter(|row| *row > 0)?;
    Some((row - 1, col - 1))
}

/// Parses a reference or range (`B5`, `B5:C7`) into its inclusive corners.
pub fn parse_range(range: &str) -> Option<(CellRef, CellRef)> {
    let (first, last) = match range.split_once(':') {
        Some((first, last)) => (reference_to_index(first)?, reference_to_index(last)?),
        None => {
            let single = reference_to_index(range)?;
            (single, single)
        }
    };
    Some((
        CellRef::new(first.0.min(last.0), first.1.min(last.1)),
        CellRef::new(first.0.max(last.0), first.1.max(last.1)),
    ))
}
