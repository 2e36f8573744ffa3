//! End-to-end orchestration: extract, clean, load.
//!
//! # Example
//!
//! ```rust,ignore
//! use centralise::config::PipelineConfig;
//! use centralise::pipeline::run_pipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = run_pipeline(&PipelineConfig::from_env()?).await?;
//!     for entity in &summary.entities {
//!         println!("{}: {} -> {} rows", entity.entity, entity.rows_in, entity.rows_out);
//!     }
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::cleaning::clean_table;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::extract::{fetch_csv, fetch_json_feed, read_table_file, table_from_bytes, SourceFormat, StoresApi};
use crate::load::Loader;
use crate::models::Entity;
use crate::table::Table;

/// A cleaned table and how many rows went in.
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub entity: Entity,
    pub rows_in: usize,
    pub table: Table,
}

impl CleanOutput {
    pub fn rows_out(&self) -> usize {
        self.table.len()
    }
}

/// Per-entity result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub entity: Entity,
    pub rows_in: usize,
    pub rows_out: usize,
    pub destination: String,
    pub path: PathBuf,
    pub fallback: bool,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: Uuid,
    pub entities: Vec<EntitySummary>,
    /// Entities without a configured source.
    pub skipped: Vec<Entity>,
}

/// Clean an in-memory table.
pub fn clean(entity: Entity, table: Table) -> PipelineResult<CleanOutput> {
    let rows_in = table.len();
    log_info(format!("Cleaning {} ({} rows)", entity, rows_in));
    let table = clean_table(entity, table)?;
    Ok(CleanOutput {
        entity,
        rows_in,
        table,
    })
}

/// Clean raw CSV or JSON bytes, e.g. an uploaded file.
pub fn clean_bytes(entity: Entity, bytes: &[u8], format: SourceFormat) -> PipelineResult<CleanOutput> {
    let table = table_from_bytes(bytes, format)?;
    clean(entity, table)
}

/// Clean a local `.csv` or `.json` file.
pub fn clean_file(entity: Entity, path: &Path) -> PipelineResult<CleanOutput> {
    let table = read_table_file(path)?;
    clean(entity, table)
}

/// Extract the raw table for `entity` from its configured source.
///
/// Returns `None` if no source is configured.
pub async fn extract(entity: Entity, config: &PipelineConfig) -> PipelineResult<Option<Table>> {
    let table = match entity {
        Entity::Users => config.users_table.as_deref().map(read_table_file).transpose()?,
        Entity::Cards => config.cards_table.as_deref().map(read_table_file).transpose()?,
        Entity::Orders => config.orders_table.as_deref().map(read_table_file).transpose()?,
        Entity::Stores => match &config.stores_api {
            Some(api) => {
                let api = StoresApi::new(&api.base_url, &api.api_key);
                let count = api.number_of_stores().await?;
                Some(api.retrieve_stores(count).await?)
            }
            None => None,
        },
        Entity::Products => match config.products_csv.as_deref() {
            Some(location) => Some(fetch_csv(location).await?),
            None => None,
        },
        Entity::SaleTimes => match config.date_details.as_deref() {
            Some(location) => Some(fetch_json_feed(location).await?),
            None => None,
        },
    };
    Ok(table)
}

/// Extract, clean and load every configured entity.
///
/// Stops at the first failing entity. Entities without a source are skipped
/// with a warning.
pub async fn run_pipeline(config: &PipelineConfig) -> PipelineResult<RunSummary> {
    if config.configured_entities().is_empty() {
        return Err(PipelineError::NothingToRun);
    }

    let run_id = Uuid::new_v4();
    log_info(format!("Pipeline run {}", run_id));

    let loader = Loader::new(&config.output_dir, config.output_format);
    let mut entities = Vec::new();
    let mut skipped = Vec::new();

    for entity in Entity::ALL {
        let Some(raw) = extract(entity, config).await? else {
            log_warning(format!("No source configured for {}, skipping", entity));
            skipped.push(entity);
            continue;
        };

        let output = clean(entity, raw)?;
        let receipt = loader.load(entity.clean_table_name(), &output.table)?;

        entities.push(EntitySummary {
            entity,
            rows_in: output.rows_in,
            rows_out: output.rows_out(),
            destination: receipt.destination,
            path: receipt.path,
            fallback: receipt.fallback,
        });
    }

    log_success(format!(
        "Pipeline run {} finished: {} tables loaded, {} skipped",
        run_id,
        entities.len(),
        skipped.len()
    ));

    Ok(RunSummary {
        run_id,
        entities,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use serde_json::{json, Value};

    const DATE_UUID: &str = "3b7ca996-37f9-433f-b6d0-ce8391b615ad";

    #[test]
    fn test_clean_bytes_json() {
        let body = json!([
            {"timestamp": "22:00:06", "month": "9", "year": "2012", "day": "19",
             "time_period": "Evening", "date_uuid": DATE_UUID},
            {"timestamp": "22:00:06", "month": "9", "year": "2012", "day": "19",
             "time_period": "Evening", "date_uuid": "NULL"}
        ]);
        let output = clean_bytes(
            Entity::SaleTimes,
            body.to_string().as_bytes(),
            SourceFormat::Json,
        )
        .unwrap();

        assert_eq!(output.rows_in, 2);
        assert_eq!(output.rows_out(), 1);
    }

    #[test]
    fn test_clean_bytes_structural_error() {
        let result = clean_bytes(Entity::Orders, b"a,b\n1,2\n", SourceFormat::Csv);
        assert!(matches!(result, Err(PipelineError::Clean(_))));
    }

    #[tokio::test]
    async fn test_nothing_to_run() {
        let result = run_pipeline(&PipelineConfig::default()).await;
        assert!(matches!(result, Err(PipelineError::NothingToRun)));
    }

    #[tokio::test]
    async fn test_run_with_local_sources() {
        let dir = tempfile::tempdir().unwrap();

        let orders = dir.path().join("orders_table.csv");
        std::fs::write(
            &orders,
            format!(
                "level_0,index,date_uuid,first_name,last_name,user_uuid,card_number,store_code,product_code,1,product_quantity\n\
                 0,0,{DATE_UUID},,,93caf182-e4e9-4c6e-bebb-60a1a9dcf9b8,30060773296197,BL-8387506C,R7-3126933h,,3\n\
                 1,1,bad,,,93caf182-e4e9-4c6e-bebb-60a1a9dcf9b8,30060773296197,BL-8387506C,R7-3126933h,,3\n"
            ),
        )
        .unwrap();

        let dates = dir.path().join("date_details.json");
        std::fs::write(
            &dates,
            json!({
                "timestamp": {"0": "22:00:06"},
                "month": {"0": "9"},
                "year": {"0": "2012"},
                "day": {"0": "19"},
                "time_period": {"0": "Evening"},
                "date_uuid": {"0": DATE_UUID}
            })
            .to_string(),
        )
        .unwrap();

        let config = PipelineConfig {
            orders_table: Some(orders.to_string_lossy().into_owned()),
            date_details: Some(dates.to_string_lossy().into_owned()),
            output_dir: dir.path().join("warehouse"),
            output_format: OutputFormat::Json,
            ..PipelineConfig::default()
        };

        let summary = run_pipeline(&config).await.unwrap();

        assert_eq!(summary.entities.len(), 2);
        assert_eq!(summary.skipped.len(), 4);

        let orders_summary = &summary.entities[0];
        assert_eq!(orders_summary.entity, Entity::Orders);
        assert_eq!((orders_summary.rows_in, orders_summary.rows_out), (2, 1));
        assert_eq!(orders_summary.destination, "orders_table");

        let dates_summary = &summary.entities[1];
        assert_eq!(dates_summary.destination, "dim_date_times");
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&dates_summary.path).unwrap()).unwrap();
        assert_eq!(written[0]["timestamp"], "22:00:06");
        assert_eq!(written[0]["month"], "9");
    }
}
