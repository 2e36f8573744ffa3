use once_cell::sync::Lazy;
use regex::Regex;

use super::nulls::canonicalize_nulls;
use super::operations::{apply_to_columns, Operation, ANY_DIGIT, LINE_BREAKS, NOT_ALNUM_OR_SPACE};
use super::{log_dropped, log_finished, log_outcomes};
use crate::error::CleanResult;
use crate::models::{Entity, CONTINENTS, COUNTRY_CODES, STORE_TYPES};
use crate::table::Table;
use crate::validation::{apply_rules, ColumnRule, Validator};

const NULLABLE: &[&str] = &[
    "address",
    "longitude",
    "locality",
    "opening_date",
    "store_type",
    "latitude",
    "country_code",
    "continent",
];

/// Mostly-empty duplicate of `latitude`, removed from the output.
const LAT: &str = "lat";

static STORE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}-[A-Z0-9]{8}$").expect("store code pattern compiles"));

static STORE_RULES: Lazy<Vec<ColumnRule>> = Lazy::new(|| {
    vec![
        ColumnRule::new(
            "continent",
            Validator::one_of(CONTINENTS)
                .or_correct(&[("Europe", "Europe"), ("America", "America")]),
        ),
        ColumnRule::new("country_code", Validator::one_of(COUNTRY_CODES)),
        ColumnRule::new("store_type", Validator::one_of(STORE_TYPES)),
        ColumnRule::new("store_code", Validator::pattern(&STORE_CODE)),
        ColumnRule::new("staff_numbers", Validator::integer()),
    ]
});

/// Clean the store details assembled from the stores API.
///
/// `staff_numbers` survives only when it already holds an integer; rows
/// without one are dropped, as are rows without a valid `store_code` or
/// `store_type`. The `index` and `lat` columns are removed.
pub fn clean_store_data(mut table: Table) -> CleanResult<Table> {
    let rows_in = table.len();

    canonicalize_nulls(&mut table, NULLABLE)?;
    if table.has_column(LAT) {
        canonicalize_nulls(&mut table, &[LAT])?;
    }

    apply_to_columns(
        &mut table,
        &["address"],
        &[Operation::Replace {
            pattern: Regex::clone(&LINE_BREAKS),
            with: " ",
        }],
    )?;
    apply_to_columns(
        &mut table,
        &["address", "locality"],
        &[Operation::Remove(Regex::clone(&NOT_ALNUM_OR_SPACE))],
    )?;
    apply_to_columns(&mut table, &["opening_date"], &[Operation::ParseDate("%d-%m-%Y")])?;
    apply_to_columns(
        &mut table,
        &["locality"],
        &[Operation::NullIfFound(Regex::clone(&ANY_DIGIT))],
    )?;

    let outcomes = apply_rules(&mut table, &STORE_RULES)?;
    log_outcomes(&outcomes);

    log_dropped(table.drop_missing(&["staff_numbers"])?, "without integer staff_numbers");
    apply_to_columns(&mut table, &["staff_numbers"], &[Operation::ToInteger])?;

    table.drop_columns(&["index", LAT]);
    log_dropped(
        table.drop_missing(&["store_code", "store_type"])?,
        "without a valid store_code or store_type",
    );
    log_dropped(table.drop_duplicates(), "duplicated");

    log_finished(Entity::Stores, rows_in, table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn store(code: &str, overrides: Value) -> Value {
        let mut base = json!({
            "index": 1,
            "address": "Flat 72W\nSally isle, East Deantown, E7B 8EB",
            "longitude": "51.62907",
            "lat": null,
            "locality": "High Wycombe",
            "store_code": code,
            "staff_numbers": 34,
            "opening_date": "13-05-2006",
            "store_type": "Local",
            "latitude": "-0.74934",
            "country_code": "GB",
            "continent": "Europe"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    }

    fn clean(records: &[Value]) -> Table {
        clean_store_data(Table::from_records(records).unwrap()).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let table = clean(&[store("HI-9B97EE4E", json!({}))]);

        assert_eq!(table.len(), 1);
        assert!(!table.has_column("lat"));
        assert!(!table.has_column("index"));
        assert_eq!(
            table.cell(0, "address"),
            Some(&Cell::text("Flat 72W Sally isle East Deantown E7B 8EB"))
        );
        assert_eq!(
            table.cell(0, "opening_date"),
            Some(&Cell::Date(NaiveDate::from_ymd_opt(2006, 5, 13).unwrap()))
        );
        assert_eq!(table.cell(0, "staff_numbers"), Some(&Cell::Int(34)));
    }

    #[test]
    fn test_store_code_shape() {
        let table = clean(&[
            store("AB-1234567", json!({})),
            store("AB-12345678", json!({"locality": "Other"})),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "store_code"), Some(&Cell::text("AB-12345678")));
    }

    #[test]
    fn test_continent_correction() {
        let table = clean(&[
            store("AB-00000001", json!({"continent": "eeEurope"})),
            store("AB-00000002", json!({"continent": "eeAmerica"})),
            store("AB-00000003", json!({"continent": "Asia"})),
        ]);

        assert_eq!(table.cell(0, "continent"), Some(&Cell::text("Europe")));
        assert_eq!(table.cell(1, "continent"), Some(&Cell::text("America")));
        assert!(table.cell(2, "continent").is_none());
    }

    #[test]
    fn test_field_level_rejections() {
        let table = clean(&[store(
            "AB-00000001",
            json!({"locality": "Town 4", "country_code": "FR", "opening_date": "2006-05-13"}),
        )]);

        assert!(table.cell(0, "locality").is_none());
        assert!(table.cell(0, "country_code").is_none());
        assert!(table.cell(0, "opening_date").is_none());
    }

    #[test]
    fn test_rows_dropped() {
        let table = clean(&[
            store("AB-00000001", json!({"staff_numbers": "J78"})),
            store("AB-00000002", json!({"staff_numbers": "34"})),
            store("AB-00000003", json!({"store_type": "Pop-up"})),
            store("AB-00000004", json!({"store_type": "NULL"})),
            store("AB-00000005", json!({})),
            store("AB-00000005", json!({})),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "store_code"), Some(&Cell::text("AB-00000005")));
    }

    #[test]
    fn test_idempotent() {
        let once = clean(&[
            store("HI-9B97EE4E", json!({"continent": "eeEurope"})),
            store("AB-12345678", json!({"locality": "4 Town"})),
            store("AB-1234567", json!({})),
        ]);
        let twice = clean_store_data(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
