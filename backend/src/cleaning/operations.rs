//! Field-level cleaning operations.
//!
//! Each [`Operation`] maps one field to a new field. Text operations work on
//! the text form of scalar cells and leave date/time cells untouched; parse
//! operations turn text into typed cells and map anything unparseable to
//! missing. Missing values pass through every operation unchanged.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::CleanResult;
use crate::table::{Cell, Field, Table};
use crate::validation::integer_value;

/// Anything that is not a letter or a hyphen.
pub static NOT_NAME_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z-]").expect("name pattern compiles"));

/// Runs of characters that are not ASCII letters, digits or whitespace.
pub static NOT_ALNUM_OR_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9\s]+").expect("alnum pattern compiles"));

/// A run of line breaks.
pub static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n]+").expect("line break pattern compiles"));

/// Any decimal digit.
pub static ANY_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("digit pattern compiles"));

/// A single cleaning step applied to one field.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Remove every match of the pattern.
    Remove(Regex),

    /// Replace every match of the pattern.
    Replace { pattern: Regex, with: &'static str },

    /// Keep only ASCII digits.
    DigitsOnly,

    /// Keep the last `n` characters.
    KeepLast(usize),

    /// Strip leading zeros.
    TrimStartZeros,

    /// Remove leading and trailing whitespace
    Trim,

    /// Whole value becomes missing if the pattern matches anywhere.
    NullIfFound(Regex),

    /// Whole value becomes missing unless the pattern matches.
    KeepIfMatches(Regex),

    /// Parse a date with a chrono format string.
    ParseDate(&'static str),

    /// Parse a `MM/YY` card expiry as the first day of that month.
    ParseMonthYear,

    /// Parse a time of day with a chrono format string.
    ParseTime(&'static str),

    /// Coerce to an integer, truncating fractional numbers.
    ToInteger,
}

impl Operation {
    /// Apply this operation to a field
    pub fn apply(&self, field: Field) -> Field {
        let cell = field?;
        match self {
            Operation::Remove(re) => map_text(cell, |s| re.replace_all(s, "").into_owned()),
            Operation::Replace { pattern, with } => {
                map_text(cell, |s| pattern.replace_all(s, *with).into_owned())
            }
            Operation::DigitsOnly => {
                map_text(cell, |s| s.chars().filter(|c| c.is_ascii_digit()).collect())
            }
            Operation::KeepLast(n) => map_text(cell, |s| {
                let count = s.chars().count();
                s.chars().skip(count.saturating_sub(*n)).collect()
            }),
            Operation::TrimStartZeros => map_text(cell, |s| s.trim_start_matches('0').to_string()),
            Operation::Trim => map_text(cell, |s| s.trim().to_string()),
            Operation::NullIfFound(re) => {
                if is_scalar(&cell) && re.is_match(&cell.to_text()) {
                    None
                } else {
                    Some(cell)
                }
            }
            Operation::KeepIfMatches(re) => {
                if re.is_match(&cell.to_text()) {
                    Some(cell)
                } else {
                    None
                }
            }
            Operation::ParseDate(format) => match cell {
                Cell::Date(_) => Some(cell),
                other => NaiveDate::parse_from_str(&other.to_text(), format)
                    .ok()
                    .map(Cell::Date),
            },
            Operation::ParseMonthYear => match cell {
                Cell::Date(_) => Some(cell),
                other => parse_month_year(&other.to_text()).map(Cell::Date),
            },
            Operation::ParseTime(format) => match cell {
                Cell::Time(_) => Some(cell),
                other => NaiveTime::parse_from_str(&other.to_text(), format)
                    .ok()
                    .map(Cell::Time),
            },
            Operation::ToInteger => integer_value(&cell, true).map(Cell::Int),
        }
    }
}

/// Run operations in sequence.
pub fn apply_all(operations: &[Operation], field: Field) -> Field {
    operations.iter().fold(field, |value, op| op.apply(value))
}

/// Run the same operation chain over several columns.
pub fn apply_to_columns(
    table: &mut Table,
    columns: &[&str],
    operations: &[Operation],
) -> CleanResult<()> {
    table.map_columns(columns, |field| apply_all(operations, field))
}

fn is_scalar(cell: &Cell) -> bool {
    !matches!(cell, Cell::Date(_) | Cell::Time(_))
}

fn map_text<F>(cell: Cell, f: F) -> Field
where
    F: FnOnce(&str) -> String,
{
    if is_scalar(&cell) {
        Some(Cell::Text(f(&cell.to_text())))
    } else {
        Some(cell)
    }
}

fn parse_month_year(text: &str) -> Option<NaiveDate> {
    let (month, year) = text.trim().split_once('/')?;
    if month.len() != 2 || year.len() != 2 {
        return None;
    }
    NaiveDate::parse_from_str(&format!("01/{}/{}", month, year), "%d/%m/%y").ok()
}
