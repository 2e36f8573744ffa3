//! # Centralise - retail data cleaning and warehouse load
//!
//! Centralise pulls the business tables of a retail company (users, cards,
//! stores, products, orders, sale times) from their sources, cleans each one
//! with a fixed set of validation and normalisation rules, and loads the
//! result into the warehouse star schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Sources   │────▶│   Extract   │────▶│    Clean    │────▶│    Load     │
//! │ CSV/API/S3  │     │  (Table)    │     │ (per entity)│     │ dim_* files │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use centralise::{clean_table, Entity, Table};
//!
//! let raw = Table::from_json(&serde_json::from_str(feed)?)?;
//! let cleaned = clean_table(Entity::SaleTimes, raw)?;
//! println!("{} rows survived", cleaned.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`table`] - Table model with an explicit missing marker
//! - [`models`] - Entities and closed value sets
//! - [`parser`] - CSV parsing with auto-detection
//! - [`validation`] - Validate-or-null column rules
//! - [`cleaning`] - Per-entity cleaning rules
//! - [`extract`] - Source adapters
//! - [`load`] - Warehouse loader
//! - [`config`] - Environment configuration
//! - [`pipeline`] - Extract, clean, load orchestration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;
pub mod table;

// Parsing
pub mod parser;

// Rules
pub mod cleaning;
pub mod validation;

// Collaborators
pub mod extract;
pub mod load;

// Orchestration
pub mod config;
pub mod pipeline;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CleanError, ConfigError, CsvError, ExtractError, LoadError, PipelineError, ServerError,
};

// =============================================================================
// Re-exports - Table and models
// =============================================================================

pub use models::{
    CardProvider, Entity, WeightUnit, CONTINENTS, COUNTRIES, COUNTRY_CODES, STORE_TYPES, TIME_PERIODS,
};
pub use table::{Cell, Field, Table};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_csv_str, ParseResult,
};

// =============================================================================
// Re-exports - Cleaning
// =============================================================================

pub use cleaning::{
    canonicalize_nulls, clean_card_data, clean_orders_data, clean_products_data,
    clean_sales_date, clean_store_data, clean_table, clean_user_data, convert_product_weights,
};
pub use validation::{apply_rules, ColumnRule, Validator};

// =============================================================================
// Re-exports - Extract / Load / Pipeline
// =============================================================================

pub use config::{OutputFormat, PipelineConfig};
pub use extract::{fetch_csv, fetch_json_feed, read_table_file, SourceFormat, StoresApi};
pub use load::{destination_for, LoadReceipt, Loader};
pub use pipeline::{run_pipeline, CleanOutput, EntitySummary, RunSummary};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, CleanMetadata, CleanResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
