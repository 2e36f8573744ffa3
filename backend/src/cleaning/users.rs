use once_cell::sync::Lazy;
use regex::Regex;

use super::nulls::canonicalize_nulls;
use super::operations::{
    apply_to_columns, Operation, LINE_BREAKS, NOT_ALNUM_OR_SPACE, NOT_NAME_CHAR,
};
use super::{log_dropped, log_finished, log_outcomes};
use crate::error::CleanResult;
use crate::models::{Entity, COUNTRIES, COUNTRY_CODES};
use crate::table::Table;
use crate::validation::{apply_rules, ColumnRule, Validator};

const NULLABLE: &[&str] = &[
    "first_name",
    "last_name",
    "email_address",
    "country",
    "country_code",
    "phone_number",
    "user_uuid",
];

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,7}\b").expect("email pattern compiles")
});

static USER_RULES: Lazy<Vec<ColumnRule>> = Lazy::new(|| {
    vec![
        ColumnRule::new("email_address", Validator::pattern(&EMAIL)),
        ColumnRule::new("country", Validator::one_of(COUNTRIES)),
        ColumnRule::new(
            "country_code",
            Validator::one_of(COUNTRY_CODES).or_correct(&[("GB", "GB")]),
        ),
        ColumnRule::new("user_uuid", Validator::uuid()),
    ]
});

/// Clean the legacy users table.
///
/// Dates of birth and join dates are read as `DD/MM/YYYY`. Phone numbers are
/// reduced to their last ten digits without leading zeros. Rows without a
/// valid `user_uuid` are dropped.
pub fn clean_user_data(mut table: Table) -> CleanResult<Table> {
    let rows_in = table.len();

    canonicalize_nulls(&mut table, NULLABLE)?;

    apply_to_columns(
        &mut table,
        &["date_of_birth", "join_date"],
        &[Operation::ParseDate("%d/%m/%Y")],
    )?;
    apply_to_columns(
        &mut table,
        &["first_name", "last_name"],
        &[Operation::Remove(Regex::clone(&NOT_NAME_CHAR))],
    )?;
    apply_to_columns(
        &mut table,
        &["address", "company"],
        &[Operation::Remove(Regex::clone(&NOT_ALNUM_OR_SPACE))],
    )?;
    apply_to_columns(
        &mut table,
        &["address", "company"],
        &[Operation::Replace {
            pattern: Regex::clone(&LINE_BREAKS),
            with: " ",
        }],
    )?;

    let outcomes = apply_rules(&mut table, &USER_RULES)?;
    log_outcomes(&outcomes);

    apply_to_columns(
        &mut table,
        &["phone_number"],
        &[
            Operation::DigitsOnly,
            Operation::KeepLast(10),
            Operation::TrimStartZeros,
        ],
    )?;

    table.drop_columns(&["index"]);
    log_dropped(table.drop_missing(&["user_uuid"])?, "without a valid user_uuid");

    log_finished(Entity::Users, rows_in, table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    const UUID: &str = "93caf182-e4e9-4c6e-bebb-60a1a9dcf9b8";

    fn user(overrides: Value) -> Value {
        let mut base = json!({
            "index": 0,
            "first_name": "Sigfried",
            "last_name": "Noack",
            "company": "Heydrich Junitz KG",
            "email_address": "rudi79@winkler.de",
            "address": "Zimmerstr. 1/0\n59015 Gießen",
            "country": "Germany",
            "country_code": "DE",
            "phone_number": "+49(0) 047905356",
            "date_of_birth": "04/10/1990",
            "join_date": "25/11/2018",
            "user_uuid": UUID
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    }

    fn clean(records: &[Value]) -> Table {
        clean_user_data(Table::from_records(records).unwrap()).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let table = clean(&[user(json!({}))]);

        assert_eq!(table.len(), 1);
        assert!(!table.has_column("index"));
        assert_eq!(
            table.cell(0, "date_of_birth"),
            Some(&Cell::Date(NaiveDate::from_ymd_opt(1990, 10, 4).unwrap()))
        );
        assert_eq!(table.cell(0, "address"), Some(&Cell::text("Zimmerstr 10 59015 Gieen")));
        assert_eq!(table.cell(0, "phone_number"), Some(&Cell::text("47905356")));
        assert_eq!(table.cell(0, "user_uuid"), Some(&Cell::text(UUID)));
    }

    #[test]
    fn test_line_breaks_collapse_to_one_space() {
        let table = clean(&[user(json!({
            "address": "Flat 6\n\nLondon\r\nW1 2AB",
            "company": "Heydrich\nJunitz KG"
        }))]);

        assert_eq!(table.cell(0, "address"), Some(&Cell::text("Flat 6 London W1 2AB")));
        assert_eq!(table.cell(0, "company"), Some(&Cell::text("Heydrich Junitz KG")));
    }

    #[test]
    fn test_country_code_correction() {
        let table = clean(&[
            user(json!({"country_code": "GGB"})),
            user(json!({"country_code": "FR"})),
        ]);

        assert_eq!(table.cell(0, "country_code"), Some(&Cell::text("GB")));
        assert!(table.cell(1, "country_code").is_none());
    }

    #[test]
    fn test_invalid_fields_become_missing() {
        let table = clean(&[user(json!({
            "first_name": "Ann3e!",
            "email_address": "not-an-email",
            "country": "France",
            "date_of_birth": "1990-10-04",
            "join_date": "NULL"
        }))]);

        assert_eq!(table.cell(0, "first_name"), Some(&Cell::text("Anne")));
        assert!(table.cell(0, "email_address").is_none());
        assert!(table.cell(0, "country").is_none());
        assert!(table.cell(0, "date_of_birth").is_none());
        assert!(table.cell(0, "join_date").is_none());
    }

    #[test]
    fn test_rows_without_uuid_dropped() {
        let table = clean(&[
            user(json!({"user_uuid": "NULL"})),
            user(json!({"user_uuid": "I7G4DMDZOZ"})),
            user(json!({})),
        ]);

        assert_eq!(table.len(), 1);
        for row in 0..table.len() {
            let uuid = table.cell(row, "user_uuid").and_then(Cell::as_str).unwrap();
            assert!(crate::validation::UUID_RE.is_match(uuid));
        }
    }

    #[test]
    fn test_idempotent() {
        let once = clean(&[
            user(json!({})),
            user(json!({"country_code": "GGB", "phone_number": "001-555-0100"})),
            user(json!({"user_uuid": "bad"})),
        ]);
        let twice = clean_user_data(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_column_is_structural() {
        let mut record = user(json!({}));
        record.as_object_mut().unwrap().remove("phone_number");
        assert!(clean_user_data(Table::from_records(&[record]).unwrap()).is_err());
    }
}
