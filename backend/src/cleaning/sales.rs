use once_cell::sync::Lazy;

use super::nulls::canonicalize_all_nulls;
use super::operations::{apply_to_columns, Operation};
use super::{log_dropped, log_finished, log_outcomes};
use crate::error::CleanResult;
use crate::models::{Entity, TIME_PERIODS};
use crate::table::{Table, TIME_FORMAT};
use crate::validation::{apply_rules, ColumnRule, Validator};

static SALE_TIME_RULES: Lazy<Vec<ColumnRule>> = Lazy::new(|| {
    vec![
        ColumnRule::new("month", Validator::in_range(1..=12)),
        ColumnRule::new("day", Validator::in_range(1..=31)),
        ColumnRule::new("year", Validator::in_range(1980..=2023)),
        ColumnRule::new("date_uuid", Validator::uuid()),
        ColumnRule::new("time_period", Validator::one_of(TIME_PERIODS)),
    ]
});

/// Clean the sale date/time details feed.
///
/// Valid `month`, `day` and `year` values are kept exactly as supplied.
pub fn clean_sales_date(mut table: Table) -> CleanResult<Table> {
    let rows_in = table.len();

    canonicalize_all_nulls(&mut table);
    apply_to_columns(&mut table, &["timestamp"], &[Operation::ParseTime(TIME_FORMAT)])?;

    let outcomes = apply_rules(&mut table, &SALE_TIME_RULES)?;
    log_outcomes(&outcomes);

    log_dropped(table.drop_missing(&["date_uuid"])?, "without a valid date_uuid");
    log_dropped(table.drop_duplicates(), "duplicated");

    log_finished(Entity::SaleTimes, rows_in, table.len());
    Ok(table)
}
