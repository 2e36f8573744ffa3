use once_cell::sync::Lazy;
use regex::Regex;

use super::nulls::canonicalize_nulls;
use super::operations::{apply_to_columns, Operation, NOT_ALNUM_OR_SPACE};
use super::{log_dropped, log_finished, log_outcomes};
use crate::api::logs::log_info_indent;
use crate::error::CleanResult;
use crate::models::{Entity, WeightUnit};
use crate::table::{Cell, Field, Table};
use crate::validation::{apply_rules, ColumnRule, Validator};

/// Derived column holding the weight in kilograms.
pub const WEIGHT_KG: &str = "weight_kg";

const NULLABLE: &[&str] = &[
    "product_name",
    "product_price",
    "weight",
    "category",
    "EAN",
    "uuid",
    "removed",
    "product_code",
];

static STARTS_WITH_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]").expect("weight prefix pattern compiles"));

/// Leading non-letter run (the amount) then the first letter run (the unit).
static AMOUNT_AND_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^a-zA-Z]+)([a-zA-Z]+)").expect("weight split pattern compiles"));

static PRODUCT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]{2}-[0-9]{7}[A-Za-z]$").expect("product code pattern compiles")
});

static PRODUCT_RULES: Lazy<Vec<ColumnRule>> = Lazy::new(|| {
    vec![
        ColumnRule::new("uuid", Validator::uuid()),
        ColumnRule::new("product_code", Validator::pattern(&PRODUCT_CODE)),
    ]
});

/// Normalise free-text product weights to kilograms.
///
/// Adds (or refreshes) a `weight_kg` column rounded to one decimal place.
/// Rows whose weight is missing or cannot be converted, such as multipacks
/// written `6 x 400g`, are dropped.
pub fn convert_product_weights(mut table: Table) -> CleanResult<Table> {
    let rows_in = table.len();

    canonicalize_nulls(&mut table, &["weight"])?;
    apply_to_columns(
        &mut table,
        &["weight"],
        &[
            Operation::KeepIfMatches(Regex::clone(&STARTS_WITH_DIGIT)),
            Operation::Trim,
        ],
    )?;

    let kilograms: Vec<Field> = table
        .column("weight")?
        .into_iter()
        .map(|field| {
            field
                .as_ref()
                .and_then(|cell| weight_in_kg(&cell.to_text()))
                .map(Cell::Float)
        })
        .collect();
    table.set_column(WEIGHT_KG, kilograms)?;

    log_dropped(
        table.drop_missing(&["weight", WEIGHT_KG])?,
        "without a convertible weight",
    );
    log_info_indent(
        format!("weights: {} of {} rows converted to kg", table.len(), rows_in),
        1,
    );
    Ok(table)
}

/// Kilograms for a weight such as `400g` or `1.5 kg`, rounded to one
/// decimal place with halves to even (`250g` gives 0.2).
pub fn weight_in_kg(weight: &str) -> Option<f64> {
    let caps = AMOUNT_AND_UNIT.captures(weight)?;
    let amount: f64 = caps.get(1)?.as_str().trim().parse().ok()?;
    let unit = WeightUnit::from_code(caps.get(2)?.as_str())?;
    let kg = amount * unit.kg_factor();
    kg.is_finite().then(|| (kg * 10.0).round_ties_even() / 10.0)
}

/// Clean the product catalogue after [`convert_product_weights`].
pub fn clean_products_data(mut table: Table) -> CleanResult<Table> {
    let rows_in = table.len();

    canonicalize_nulls(&mut table, NULLABLE)?;

    let outcomes = apply_rules(&mut table, &PRODUCT_RULES)?;
    log_outcomes(&outcomes);

    apply_to_columns(
        &mut table,
        &["product_name"],
        &[Operation::Remove(Regex::clone(&NOT_ALNUM_OR_SPACE))],
    )?;
    apply_to_columns(&mut table, &["date_added"], &[Operation::ParseDate("%Y-%m-%d")])?;

    log_dropped(table.drop_missing(&["uuid"])?, "without a valid uuid");
    log_dropped(table.drop_duplicates(), "duplicated");

    log_finished(Entity::Products, rows_in, table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    const UUID: &str = "83dc0a69-f96f-4c34-bcb7-928acae19a94";

    fn product(weight: &str, overrides: Value) -> Value {
        let mut base = json!({
            "product_name": "FurReal Dazzlin' Dimples My Playful Dolphin",
            "product_price": "£39.99",
            "weight": weight,
            "category": "toys-and-games",
            "EAN": "7425710935115",
            "date_added": "2005-12-02",
            "uuid": UUID,
            "removed": "Still_avaliable",
            "product_code": "R7-3126933h"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    }

    fn weights(records: &[Value]) -> Table {
        convert_product_weights(Table::from_records(records).unwrap()).unwrap()
    }

    #[test]
    fn test_weight_in_kg() {
        assert_eq!(weight_in_kg("400g"), Some(0.4));
        assert_eq!(weight_in_kg("2kg"), Some(2.0));
        assert_eq!(weight_in_kg("1oz"), Some(0.0));
        assert_eq!(weight_in_kg("250ml"), Some(0.2));
        assert_eq!(weight_in_kg("350g"), Some(0.4));
        assert_eq!(weight_in_kg("1.5 kg"), Some(1.5));
        assert_eq!(weight_in_kg("77g ."), Some(0.1));
        assert_eq!(weight_in_kg("6 x 400g"), None);
        assert_eq!(weight_in_kg("12lb"), None);
        assert_eq!(weight_in_kg("400"), None);
    }

    #[test]
    fn test_convert_drops_unusable_weights() {
        let table = weights(&[
            product("400g", json!({})),
            product("2kg", json!({})),
            product("6 x 400g", json!({})),
            product("NULL", json!({})),
            product("9GO9NZ5JTL", json!({})),
            product("1oz", json!({})),
        ]);

        let kg: Vec<Option<&Cell>> = (0..table.len()).map(|r| table.cell(r, WEIGHT_KG)).collect();
        assert_eq!(
            kg,
            vec![
                Some(&Cell::Float(0.4)),
                Some(&Cell::Float(2.0)),
                Some(&Cell::Float(0.0)),
            ]
        );
        assert_eq!(table.cell(2, "weight"), Some(&Cell::text("1oz")));
    }

    #[test]
    fn test_clean_products() {
        let table = clean_products_data(weights(&[
            product("400g", json!({})),
            product("400g", json!({})),
            product("1kg", json!({"uuid": "NULL"})),
            product("1kg", json!({"uuid": "83DC0A69", "product_code": "R7-312693h"})),
            product("1kg", json!({"product_code": "R7-312693h", "date_added": "September 2017"})),
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.cell(0, "product_name"),
            Some(&Cell::text("FurReal Dazzlin Dimples My Playful Dolphin"))
        );
        assert_eq!(
            table.cell(0, "date_added"),
            Some(&Cell::Date(NaiveDate::from_ymd_opt(2005, 12, 2).unwrap()))
        );
        assert_eq!(table.cell(0, "product_code"), Some(&Cell::text("R7-3126933h")));
        assert!(table.cell(1, "product_code").is_none());
        assert!(table.cell(1, "date_added").is_none());
    }

    #[test]
    fn test_idempotent() {
        let raw = [
            product("400g", json!({})),
            product("77g .", json!({"uuid": "0f34b5c2-a7ab-4b3e-a2a1-7b1b0c9b2ef1"})),
            product("6 x 400g", json!({})),
        ];
        let once = clean_products_data(weights(&raw)).unwrap();
        let twice = clean_products_data(convert_product_weights(once.clone()).unwrap()).unwrap();
        assert_eq!(once, twice);
    }
}
