use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use std::fmt::Display;

/// Types of cell data in xlsx worksheets.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (true/false)
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline and formula string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Date and time tokens inside quoted literals, escapes and `[...]` sections are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_literal => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// A typed cell value as it appears in a worksheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Cached error literal such as `#N/A`
    Error(String),
}

impl Value {
    /// Missing cells and empty strings both count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(text) => text.is_empty(),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(text) => f.write_str(text),
            Value::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                write!(f, "{}", *number as i64)
            }
            Value::Number(number) => write!(f, "{}", number),
            Value::Boolean(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            Value::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Value::Time(time) => write!(f, "{}", time.format("%H:%M:%S")),
            Value::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            Value::Error(error) => f.write_str(error),
        }
    }
}

/// Represents a single cell in a worksheet with position, type, and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell value; shared strings are already resolved to their text
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw value into a typed [`Value`] according to the cell type.
    pub(crate) fn to_value(&self) -> Result<Value, String> {
        match self.kind {
            CellType::Empty => Ok(Value::Empty),
            CellType::Boolean => Ok(Value::Boolean(self.value == "1" || self.value.eq_ignore_ascii_case("true"))),
            CellType::Number => Ok(Value::Number(self.to_double()?)),
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                let serial = self.to_double()?;
                let datetime = serial_to_datetime(serial, self.kind.is_1904())
                    .ok_or_else(|| format!("parse '{}' to date failed", self.value))?;
                if serial.fract() == 0.0 {
                    Ok(Value::Date(datetime.date()))
                } else {
                    Ok(Value::DateTime(datetime))
                }
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                let serial = self.to_double()?;
                if (0.0..1.0).contains(&serial) {
                    serial_to_time(serial)
                        .map(Value::Time)
                        .ok_or_else(|| format!("parse '{}' to time failed", self.value))
                } else {
                    serial_to_datetime(serial, self.kind.is_1904())
                        .map(Value::DateTime)
                        .ok_or_else(|| format!("parse '{}' to datetime failed", self.value))
                }
            }
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                serial_to_datetime(self.to_double()?, self.kind.is_1904())
                    .map(Value::DateTime)
                    .ok_or_else(|| format!("parse '{}' to datetime failed", self.value))
            }
            CellType::IsoDateTime => self.to_iso_value(),
            CellType::InlineString | CellType::SharedString => Ok(Value::Text(self.value.to_owned())),
            CellType::Error => Ok(Value::Error(self.value.to_owned())),
        }
    }

    /// Converts cell value to double-precision floating point.
    fn to_double(&self) -> Result<f64, String> {
        self.value.trim().parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }

    /// Parses `t="d"` cells: `2024-01-31`, `2024-01-31T08:30:00`, or `08:30:00`.
    fn to_iso_value(&self) -> Result<Value, String> {
        let value = self.value.trim().trim_end_matches('Z');
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(Value::DateTime(datetime))
        } else if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(Value::Date(date))
        } else if let Ok(time) = NaiveTime::parse_from_str(value, "%H:%M:%S%.f") {
            Ok(Value::Time(time))
        } else {
            Err(format!("parse '{}' to iso8601 datetime failed", self.value))
        }
    }
}

/// Converts an Excel serial number to a date-time.
/// Handles the Lotus 1-2-3 leap year bug of the 1900 epoch.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1_462
    } else if days < 60 {
        1
    } else {
        0
    };
    let midnight = NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_signed(Duration::try_days(days.checked_add(offset)?)?)?
        .and_hms_opt(0, 0, 0)?;
    let micros = (serial.fract() * 86_400_000_000f64).round() as i64;
    midnight.checked_add_signed(Duration::microseconds(micros))
}

/// Converts the fractional day of an Excel serial number to a time of day.
pub(crate) fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    let micros = (serial.fract() * 86_400_000_000f64).round() as i64;
    let seconds = (micros / 1_000_000).min(86_399) as u32;
    let nanos = ((micros % 1_000_000) * 1_000) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
}
