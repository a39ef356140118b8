//! Prefixes extracted windows with their link metadata.

use crate::merge::extractor::ColumnWindow;
use crate::merge::extractor::WINDOW_WIDTH;
use crate::merge::scanner::LinkRecord;
use crate::spreadsheet::Value;
use std::fmt;

/// Target identifier and display label followed by the column window.
pub const OUTPUT_WIDTH: usize = WINDOW_WIDTH + 2;

/// One row of the output sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRow(pub [Value; OUTPUT_WIDTH]);

impl OutputRow {
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Display for OutputRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::Empty => f.write_str("None")?,
                Value::Text(text) => write!(f, "{:?}", text)?,
                other => write!(f, "{}", other)?,
            }
        }
        f.write_str(")")
    }
}

/// Builds `(target, label, v1..v6)`; values pass through unchanged.
pub fn transform(window: ColumnWindow, link: &LinkRecord) -> OutputRow {
    let [v1, v2, v3, v4, v5, v6] = window;
    OutputRow([
        Value::Text(link.target.to_owned()),
        link.label.clone(),
        v1,
        v2,
        v3,
        v4,
        v5,
        v6,
    ])
}
