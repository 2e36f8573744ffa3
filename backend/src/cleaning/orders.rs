use once_cell::sync::Lazy;
use regex::Regex;

use super::operations::{apply_to_columns, Operation};
use super::{log_dropped, log_finished, log_outcomes};
use crate::error::CleanResult;
use crate::models::Entity;
use crate::table::Table;
use crate::validation::{apply_rules, ColumnRule, Validator};

/// Personal and export-artifact columns that never reach the orders table.
const DROPPED_COLUMNS: &[&str] = &["first_name", "last_name", "1", "level_0", "index"];

static STORE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,3}-[A-Z0-9]{8}$").expect("store code pattern compiles"));

static PRODUCT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][0-9]-[0-9]{5,7}[a-zA-Z]$").expect("product code pattern compiles")
});

static ORDER_RULES: Lazy<Vec<ColumnRule>> = Lazy::new(|| {
    vec![
        ColumnRule::new("user_uuid", Validator::uuid()),
        ColumnRule::new("date_uuid", Validator::uuid()),
        ColumnRule::new("store_code", Validator::pattern(&STORE_CODE)),
        ColumnRule::new("product_code", Validator::pattern(&PRODUCT_CODE)),
    ]
});

/// Clean the orders table.
///
/// Only formats are checked; nothing is cross-referenced against the other
/// tables. Rows with a non-numeric `product_quantity` or without a valid
/// `date_uuid` are dropped.
pub fn clean_orders_data(mut table: Table) -> CleanResult<Table> {
    let rows_in = table.len();

    table.drop_columns(DROPPED_COLUMNS);

    apply_to_columns(&mut table, &["card_number"], &[Operation::DigitsOnly])?;

    apply_to_columns(&mut table, &["product_quantity"], &[Operation::ToInteger])?;
    log_dropped(
        table.drop_missing(&["product_quantity"])?,
        "with a non-numeric product_quantity",
    );

    let outcomes = apply_rules(&mut table, &ORDER_RULES)?;
    log_outcomes(&outcomes);

    log_dropped(table.drop_missing(&["date_uuid"])?, "without a valid date_uuid");

    log_finished(Entity::Orders, rows_in, table.len());
    Ok(table)
}
