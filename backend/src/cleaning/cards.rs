use once_cell::sync::Lazy;
use regex::Regex;

use super::operations::{apply_to_columns, Operation};
use super::{log_dropped, log_finished, log_outcomes};
use crate::api::logs::log_info_indent;
use crate::error::CleanResult;
use crate::models::{CardProvider, Entity};
use crate::table::{Cell, Field, Table};
use crate::validation::{apply_rules, ColumnRule, Validator};

/// Transient column marking whether a card number has its provider's length.
const CARD_CHECK: &str = "card_check";

static PROVIDER_RULE: Lazy<Vec<ColumnRule>> =
    Lazy::new(|| vec![ColumnRule::new("card_provider", Validator::one_of(CardProvider::NAMES))]);

/// Twelve to nineteen digits, i.e. a length in [12, 20).
static CARD_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{12,19}$").expect("card number pattern compiles"));

static CARD_NUMBER_RULE: Lazy<Vec<ColumnRule>> =
    Lazy::new(|| vec![ColumnRule::new("card_number", Validator::pattern(&CARD_NUMBER))]);

/// Clean the card details table.
///
/// Rows with an unknown provider or an unusable card number are dropped.
/// `expiry_date` is read as `MM/YY` (first day of the month) and
/// `date_payment_confirmed` as `YYYY-MM-DD`.
pub fn clean_card_data(mut table: Table) -> CleanResult<Table> {
    let rows_in = table.len();

    let outcomes = apply_rules(&mut table, &PROVIDER_RULE)?;
    log_outcomes(&outcomes);
    log_dropped(table.drop_missing(&["card_provider"])?, "with an unknown card provider");

    apply_to_columns(&mut table, &["card_number"], &[Operation::DigitsOnly])?;

    let checks = provider_length_checks(&table)?;
    let matching = checks.iter().filter(|c| c.is_some()).count();
    log_info_indent(
        format!("{} of {} card numbers have their provider's length", matching, checks.len()),
        1,
    );
    table.set_column(CARD_CHECK, checks)?;

    let outcomes = apply_rules(&mut table, &CARD_NUMBER_RULE)?;
    log_outcomes(&outcomes);

    apply_to_columns(
        &mut table,
        &["date_payment_confirmed"],
        &[Operation::ParseDate("%Y-%m-%d")],
    )?;
    apply_to_columns(&mut table, &["expiry_date"], &[Operation::ParseMonthYear])?;

    log_dropped(table.drop_missing(&["card_number"])?, "without a usable card number");
    log_dropped(table.drop_duplicates(), "duplicated");
    table.drop_columns(&[CARD_CHECK]);

    log_finished(Entity::Cards, rows_in, table.len());
    Ok(table)
}

/// `true` where the card number length is one the provider issues, missing
/// otherwise.
fn provider_length_checks(table: &Table) -> CleanResult<Vec<Field>> {
    let provider_idx = table.column_index("card_provider")?;
    let number_idx = table.column_index("card_number")?;

    Ok(table
        .rows()
        .map(|row| {
            let provider = row[provider_idx]
                .as_ref()
                .and_then(Cell::as_str)
                .and_then(CardProvider::from_name)?;
            let digits = row[number_idx].as_ref().map(|c| c.to_text().chars().count())?;
            provider
                .allowed_lengths()
                .contains(&digits)
                .then_some(Cell::Bool(true))
        })
        .collect())
}
