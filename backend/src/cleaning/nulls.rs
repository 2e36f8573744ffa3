//! Null canonicalisation.
//!
//! Upstream exports spell "no value" as literal strings. Before any other
//! rule runs, those sentinels are turned into the missing marker so that the
//! validators only ever see real data.

use crate::error::CleanResult;
use crate::table::{Cell, Field, Table};

/// Literal strings treated as missing. Matched against the whole cell,
/// case-sensitively.
pub const NULL_SENTINELS: &[&str] = &["NULL", "None", "null", "N/A"];

/// True if the field is a text cell holding a null sentinel.
pub fn is_null_sentinel(field: &Field) -> bool {
    matches!(field, Some(Cell::Text(s)) if NULL_SENTINELS.contains(&s.as_str()))
}

fn canonical(field: Field) -> Field {
    if is_null_sentinel(&field) {
        None
    } else {
        field
    }
}

/// Replace null sentinels with the missing marker in the named columns.
///
/// Every named column must exist. Returns the number of values nulled.
pub fn canonicalize_nulls(table: &mut Table, columns: &[&str]) -> CleanResult<usize> {
    let mut nulled = 0;
    table.map_columns(columns, |field| {
        if is_null_sentinel(&field) {
            nulled += 1;
        }
        canonical(field)
    })?;
    Ok(nulled)
}

/// [`canonicalize_nulls`] over every column of the table.
pub fn canonicalize_all_nulls(table: &mut Table) -> usize {
    let columns: Vec<String> = table.columns().to_vec();
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    // Column names come from the table itself, so none can be missing.
    canonicalize_nulls(table, &names).unwrap_or(0)
}
