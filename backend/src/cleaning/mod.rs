//! Per-entity cleaning rules.
//!
//! Each rule takes a raw [`Table`] and returns the cleaned table. Rules are
//! pure and synchronous, share no state, and are idempotent: cleaning an
//! already-cleaned table returns it unchanged.
//!
//! - [`clean_user_data`] - users from the relational export
//! - [`clean_card_data`] - card details from the card document
//! - [`clean_store_data`] - stores from the stores API
//! - [`convert_product_weights`] then [`clean_products_data`] - product catalogue
//! - [`clean_orders_data`] - orders table
//! - [`clean_sales_date`] - sale date/time feed

pub mod nulls;
pub mod operations;

mod cards;
mod orders;
mod products;
mod sales;
mod stores;
mod users;

pub use cards::clean_card_data;
pub use nulls::{canonicalize_all_nulls, canonicalize_nulls, NULL_SENTINELS};
pub use operations::{apply_all, apply_to_columns, Operation};
pub use orders::clean_orders_data;
pub use products::{clean_products_data, convert_product_weights};
pub use sales::clean_sales_date;
pub use stores::clean_store_data;
pub use users::clean_user_data;

use crate::api::logs::{log_info_indent, log_warning};
use crate::error::CleanResult;
use crate::models::Entity;
use crate::table::Table;
use crate::validation::RuleOutcome;

/// Run the cleaning rule for `entity`.
///
/// Products go through the weight normaliser before the product rule.
pub fn clean_table(entity: Entity, table: Table) -> CleanResult<Table> {
    match entity {
        Entity::Users => clean_user_data(table),
        Entity::Cards => clean_card_data(table),
        Entity::Stores => clean_store_data(table),
        Entity::Products => clean_products_data(convert_product_weights(table)?),
        Entity::Orders => clean_orders_data(table),
        Entity::SaleTimes => clean_sales_date(table),
    }
}

fn log_dropped(removed: usize, reason: &str) {
    if removed > 0 {
        log_info_indent(format!("Dropped {} rows {}", removed, reason), 1);
    }
}

fn log_outcomes(outcomes: &[RuleOutcome]) {
    for outcome in outcomes {
        if outcome.corrected > 0 {
            log_info_indent(
                format!("{}: corrected {} values", outcome.column, outcome.corrected),
                1,
            );
        }
        if outcome.rejected > 0 {
            log_info_indent(
                format!("{}: {} invalid values set to missing", outcome.column, outcome.rejected),
                1,
            );
        }
    }
}

fn log_finished(entity: Entity, rows_in: usize, rows_out: usize) {
    if rows_out == 0 && rows_in > 0 {
        log_warning(format!("{}: every row was dropped", entity));
    }
    log_info_indent(format!("{}: {} rows in, {} rows out", entity, rows_in, rows_out), 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_table_dispatches_products_through_weights() {
        let raw = Table::from_records(&[json!({
            "product_name": "Tea",
            "product_price": "£1.00",
            "weight": "250g",
            "category": "food",
            "EAN": "123",
            "date_added": "2020-01-02",
            "uuid": "83dc0a69-f96f-4c34-bcb7-928acae19a94",
            "removed": "Still_avaliable",
            "product_code": "A8-4686892S"
        })])
        .unwrap();

        let cleaned = clean_table(Entity::Products, raw).unwrap();
        assert!(cleaned.has_column("weight_kg"));
        assert_eq!(cleaned.len(), 1);
    }
}
