//! In-memory table model shared by every cleaning rule.
//!
//! A [`Table`] is an ordered list of column names plus rows holding one
//! [`Field`] per column. A field is `Option<Cell>`: `None` is the missing
//! marker, distinct from an empty string or zero. Cells stay weakly typed
//! ([`Cell::Text`], [`Cell::Int`], ...) until a rule parses them, and rules
//! that parse dates or times store the typed value so that running a rule
//! again over its own output changes nothing.
//!
//! Row order is positional, so dropping rows re-sequences the table.

use chrono::{NaiveDate, NaiveTime};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{CleanError, CleanResult};

/// Output format for date cells.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Output format for time-of-day cells.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A present value.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// A value that may be missing.
pub type Field = Option<Cell>;

impl Cell {
    /// Shorthand for a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Borrow the string of a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used by every pattern test.
    ///
    /// Whole floats keep one decimal (`3.0`), matching how the upstream
    /// exports print them.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
                    format!("{:.1}", f)
                } else {
                    f.to_string()
                }
            }
            Cell::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
            Cell::Date(d) => d.format(DATE_FORMAT).to_string(),
            Cell::Time(t) => t.format(TIME_FORMAT).to_string(),
        }
    }

    /// Read a JSON value. `null` becomes the missing marker; arrays and
    /// objects are kept as their JSON text, as are integers too large for
    /// an `i64`.
    pub fn from_json(value: &Value) -> Field {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Cell::Bool(*b)),
            // integers past i64 keep their digits as text
            Value::Number(n) if n.is_i64() => n.as_i64().map(Cell::Int),
            Value::Number(n) if n.is_u64() => Some(Cell::Text(n.to_string())),
            Value::Number(n) => n.as_f64().map(Cell::Float),
            Value::String(s) => Some(Cell::Text(s.clone())),
            other => Some(Cell::Text(other.to_string())),
        }
    }

    /// JSON form handed to the loader.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Int(n) => Value::Number((*n).into()),
            Cell::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Date(_) | Cell::Time(_) => Value::String(self.to_text()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// Floats compare by bit pattern so that duplicate detection treats two NaN
// cells as equal.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Int(a), Cell::Int(b)) => a == b,
            (Cell::Float(a), Cell::Float(b)) => a.to_bits() == b.to_bits(),
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Date(a), Cell::Date(b)) => a == b,
            (Cell::Time(a), Cell::Time(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Text(s) => s.hash(state),
            Cell::Int(n) => n.hash(state),
            Cell::Float(f) => f.to_bits().hash(state),
            Cell::Bool(b) => b.hash(state),
            Cell::Date(d) => d.hash(state),
            Cell::Time(t) => t.hash(state),
        }
    }
}

/// Ordered rows of named, weakly typed fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Field>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from JSON records.
    ///
    /// The first record fixes the column set and order. Later records are
    /// read by key: absent keys become missing, extra keys are ignored.
    pub fn from_records(records: &[Value]) -> CleanResult<Self> {
        let Some(first) = records.first() else {
            return Ok(Self::default());
        };
        let first = first.as_object().ok_or(CleanError::NotAnObject { row: 0 })?;
        let mut table = Self::new(first.keys().cloned().collect());

        for (row_idx, record) in records.iter().enumerate() {
            let obj = record
                .as_object()
                .ok_or(CleanError::NotAnObject { row: row_idx })?;
            let row = table
                .columns
                .iter()
                .map(|col| obj.get(col).and_then(Cell::from_json))
                .collect();
            table.rows.push(row);
        }

        Ok(table)
    }

    /// Build a table from a JSON document.
    ///
    /// Accepts an array of records, or a column-oriented object such as
    /// `{"month": {"0": "9", "1": "2"}, "year": {"0": "2012", "1": "1997"}}`
    /// where rows are keyed by the index labels of the first column.
    pub fn from_json(value: &Value) -> CleanResult<Self> {
        match value {
            Value::Array(records) => Self::from_records(records),
            Value::Object(columns) if columns.values().all(Value::is_object) => {
                Self::from_column_map(columns)
            }
            Value::Object(_) => Err(CleanError::UnsupportedShape(
                "object values must all be column objects".to_string(),
            )),
            other => Err(CleanError::UnsupportedShape(format!(
                "expected an array or object, found {}",
                json_kind(other)
            ))),
        }
    }

    fn from_column_map(columns: &Map<String, Value>) -> CleanResult<Self> {
        let mut table = Self::new(columns.keys().cloned().collect());
        let labels: Vec<String> = columns
            .values()
            .next()
            .and_then(Value::as_object)
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        for label in &labels {
            let row = columns
                .values()
                .map(|col| col.get(label.as_str()).and_then(Cell::from_json))
                .collect();
            table.rows.push(row);
        }

        Ok(table)
    }

    /// Convert back to JSON records, missing values as `null`.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(col, field)| {
                        let value = field.as_ref().map(Cell::to_json).unwrap_or(Value::Null);
                        (col.clone(), value)
                    })
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }

    /// Append a row. It must hold one field per column.
    pub fn push_row(&mut self, row: Vec<Field>) -> CleanResult<()> {
        if row.len() != self.columns.len() {
            return Err(CleanError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of a column, or a structural error if it is absent.
    pub fn column_index(&self, name: &str) -> CleanResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CleanError::MissingColumn(name.to_string()))
    }

    /// Iterate rows as field slices, in column order.
    pub fn rows(&self) -> impl Iterator<Item = &[Field]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Value at `row` in `column`, if the column exists and the value is present.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)?.as_ref()
    }

    /// All fields of one column.
    pub fn column(&self, name: &str) -> CleanResult<Vec<&Field>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Replace every field of a column with `f(field)`.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> CleanResult<()>
    where
        F: FnMut(Field) -> Field,
    {
        let idx = self.column_index(name)?;
        for row in &mut self.rows {
            let field = row[idx].take();
            row[idx] = f(field);
        }
        Ok(())
    }

    /// Apply `f` to every field of each named column.
    pub fn map_columns<F>(&mut self, names: &[&str], mut f: F) -> CleanResult<()>
    where
        F: FnMut(Field) -> Field,
    {
        for name in names {
            self.map_column(name, &mut f)?;
        }
        Ok(())
    }

    /// Add a column, or overwrite it if it already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<Field>) -> CleanResult<()> {
        if values.len() != self.rows.len() {
            return Err(CleanError::RowWidth {
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Remove the named columns. Names that are not present are skipped.
    ///
    /// Returns the number of columns removed.
    pub fn drop_columns(&mut self, names: &[&str]) -> usize {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.contains(&c.as_str()))
            .collect();
        let removed = keep.iter().filter(|k| !**k).count();
        if removed == 0 {
            return 0;
        }

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
        removed
    }

    /// Keep only rows for which `keep` returns true. Returns rows removed.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Field]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }

    /// Drop rows where any of `subset` is missing. Returns rows removed.
    pub fn drop_missing(&mut self, subset: &[&str]) -> CleanResult<usize> {
        let indexes = subset
            .iter()
            .map(|name| self.column_index(name))
            .collect::<CleanResult<Vec<_>>>()?;
        Ok(self.retain_rows(|row| indexes.iter().all(|&i| row[i].is_some())))
    }

    /// Drop exact duplicate rows, keeping the first occurrence.
    pub fn drop_duplicates(&mut self) -> usize {
        let mut seen: HashSet<Vec<Field>> = HashSet::with_capacity(self.rows.len());
        self.retain_rows(|row| seen.insert(row.to_vec()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
