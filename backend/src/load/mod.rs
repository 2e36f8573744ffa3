//! Warehouse loader.
//!
//! Maps a cleaned table's logical name to its warehouse destination and
//! writes the table there as `<output_dir>/<destination>.<json|csv>`.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::logs::{log_success, log_warning};
use crate::config::OutputFormat;
use crate::error::{LoadError, LoadResult};
use crate::table::Table;

/// Destination used for names with no mapping.
pub const FALLBACK_DESTINATION: &str = "dim_date_times";

/// Logical cleaned-table name to warehouse table.
pub const DESTINATIONS: &[(&str, &str)] = &[
    ("user_data_clean", "dim_users"),
    ("card_data_clean", "dim_card_details"),
    ("store_data_clean", "dim_store_details"),
    ("product_data_clean", "dim_products"),
    ("order_data_clean", "orders_table"),
    ("sales_date_clean", "dim_date_times"),
];

/// Resolved destination of a cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub table: &'static str,
    /// The name had no mapping and went to [`FALLBACK_DESTINATION`].
    pub fallback: bool,
}

/// Resolve a logical table name. Unmapped names go to the fallback
/// destination with a warning.
pub fn destination_for(name: &str) -> Destination {
    match DESTINATIONS.iter().find(|(logical, _)| *logical == name) {
        Some(&(_, table)) => Destination {
            table,
            fallback: false,
        },
        None => {
            log_warning(format!(
                "No destination mapped for '{}', loading into {}",
                name, FALLBACK_DESTINATION
            ));
            Destination {
                table: FALLBACK_DESTINATION,
                fallback: true,
            }
        }
    }
}

/// What a load wrote, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReceipt {
    pub destination: String,
    pub path: PathBuf,
    pub rows: usize,
    pub fallback: bool,
}

/// Writes cleaned tables into an output directory.
#[derive(Debug, Clone)]
pub struct Loader {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl Loader {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Write `table` to the destination mapped for `name`, replacing any
    /// previous load.
    pub fn load(&self, name: &str, table: &Table) -> LoadResult<LoadReceipt> {
        let destination = destination_for(name);
        fs::create_dir_all(&self.output_dir)?;

        let path = self
            .output_dir
            .join(format!("{}.{}", destination.table, self.format.extension()));
        write_table(&path, table, self.format)?;

        log_success(format!(
            "Loaded {} rows into {} ({})",
            table.len(),
            destination.table,
            path.display()
        ));

        Ok(LoadReceipt {
            destination: destination.table.to_string(),
            path,
            rows: table.len(),
            fallback: destination.fallback,
        })
    }
}

/// Write a table as JSON records or CSV.
pub fn write_table(path: &Path, table: &Table, format: OutputFormat) -> LoadResult<()> {
    match format {
        OutputFormat::Json => {
            let content = serde_json::to_string_pretty(&table.to_records())?;
            fs::write(path, content)?;
        }
        OutputFormat::Csv => fs::write(path, table_to_csv(table)?)?,
    }
    Ok(())
}

/// Render a table as CSV. Missing values are empty cells.
pub fn table_to_csv(table: &Table) -> LoadResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(
            row.iter()
                .map(|field| field.as_ref().map(|c| c.to_text()).unwrap_or_default()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| LoadError::IoError(e.into_error()))
}
