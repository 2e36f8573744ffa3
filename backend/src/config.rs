//! Pipeline configuration.
//!
//! Read from the environment (a `.env` file is loaded by the binary at
//! start-up). Every source is optional; the pipeline skips the ones that
//! are not set.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `USERS_TABLE_PATH` | export of the legacy users table |
//! | `CARDS_TABLE_PATH` | export of the card details document |
//! | `ORDERS_TABLE_PATH` | export of the orders table |
//! | `STORES_API_URL` / `STORES_API_KEY` | stores API base URL and key |
//! | `PRODUCTS_CSV_URL` | product catalogue CSV (URL or path) |
//! | `DATE_DETAILS_URL` | sale date/time JSON feed (URL or path) |
//! | `OUTPUT_DIR` | loader destination directory, default `warehouse` |
//! | `OUTPUT_FORMAT` | `json` (default) or `csv` |

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::models::Entity;

/// Default loader directory.
pub const DEFAULT_OUTPUT_DIR: &str = "warehouse";

/// File format written by the loader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(ConfigError::Invalid {
                var: "OUTPUT_FORMAT".to_string(),
                message: format!("expected json or csv, got '{}'", other),
            }),
        }
    }
}

/// Credentials and base URL of the stores API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoresApiConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Where each source lives and where cleaned tables go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub users_table: Option<String>,
    pub cards_table: Option<String>,
    pub orders_table: Option<String>,
    pub stores_api: Option<StoresApiConfig>,
    pub products_csv: Option<String>,
    pub date_details: Option<String>,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            users_table: None,
            cards_table: None,
            orders_table: None,
            stores_api: None,
            products_csv: None,
            date_details: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_format: OutputFormat::default(),
        }
    }
}

impl PipelineConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let stores_api = match (get("STORES_API_URL"), get("STORES_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(StoresApiConfig { base_url, api_key }),
            (Some(_), None) => {
                return Err(ConfigError::Invalid {
                    var: "STORES_API_KEY".to_string(),
                    message: "required when STORES_API_URL is set".to_string(),
                })
            }
            _ => None,
        };

        let output_format = match get("OUTPUT_FORMAT") {
            Some(value) => value.parse()?,
            None => OutputFormat::default(),
        };

        Ok(Self {
            users_table: get("USERS_TABLE_PATH"),
            cards_table: get("CARDS_TABLE_PATH"),
            orders_table: get("ORDERS_TABLE_PATH"),
            stores_api,
            products_csv: get("PRODUCTS_CSV_URL"),
            date_details: get("DATE_DETAILS_URL"),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            output_format,
        })
    }

    /// True if a source is configured for `entity`.
    pub fn has_source(&self, entity: Entity) -> bool {
        match entity {
            Entity::Users => self.users_table.is_some(),
            Entity::Cards => self.cards_table.is_some(),
            Entity::Stores => self.stores_api.is_some(),
            Entity::Products => self.products_csv.is_some(),
            Entity::Orders => self.orders_table.is_some(),
            Entity::SaleTimes => self.date_details.is_some(),
        }
    }

    /// Entities with a configured source, in pipeline order.
    pub fn configured_entities(&self) -> Vec<Entity> {
        Entity::ALL
            .into_iter()
            .filter(|e| self.has_source(*e))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<PipelineConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert!(cfg.configured_entities().is_empty());
    }

    #[test]
    fn test_sources_and_output() {
        let cfg = config(&[
            ("USERS_TABLE_PATH", "exports/legacy_users.csv"),
            ("DATE_DETAILS_URL", "https://example.com/date_details.json"),
            ("OUTPUT_DIR", "/tmp/wh"),
            ("OUTPUT_FORMAT", "CSV"),
            ("ORDERS_TABLE_PATH", "  "),
        ])
        .unwrap();

        assert_eq!(cfg.configured_entities(), vec![Entity::Users, Entity::SaleTimes]);
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/wh"));
        assert_eq!(cfg.output_format, OutputFormat::Csv);
    }

    #[test]
    fn test_stores_api_needs_key() {
        assert!(config(&[("STORES_API_URL", "https://api")]).is_err());

        let cfg = config(&[("STORES_API_URL", "https://api"), ("STORES_API_KEY", "k")]).unwrap();
        assert!(cfg.has_source(Entity::Stores));
    }

    #[test]
    fn test_bad_output_format() {
        let err = config(&[("OUTPUT_FORMAT", "parquet")]).unwrap_err();
        assert!(err.to_string().contains("parquet"));
    }
}
