//! Error types for the centralisation pipeline.
//!
//! This module defines one error type per layer:
//!
//! - [`CsvError`] - CSV reading and decoding errors
//! - [`CleanError`] - Structural errors raised by a cleaning rule
//! - [`ExtractError`] - Source adapter errors
//! - [`LoadError`] - Warehouse loader errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Field-level problems (a date that does not parse, a code with the wrong
//! shape) are never errors: the cleaners turn them into missing values.
//! Only structural problems surface here.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode content.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        CsvError::ParseError {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Cleaning Errors
// =============================================================================

/// Structural errors raised by a cleaning rule.
///
/// A rule either returns a fully cleaned table or one of these; there is no
/// partially cleaned output.
#[derive(Debug, Error, PartialEq)]
pub enum CleanError {
    /// A column the rule needs is absent from the input table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A record handed to the table builder is not a JSON object.
    #[error("Record {row} is not a JSON object")]
    NotAnObject { row: usize },

    /// The JSON document cannot be read as a table.
    #[error("Unsupported table shape: {0}")]
    UnsupportedShape(String),

    /// A row does not have one value per column.
    #[error("Row has {found} values but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors from the source adapters.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// Expected field missing from an API response.
    #[error("Response field missing: {0}")]
    MissingField(String),

    /// File extension is neither csv nor json.
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// IO error.
    #[error("Source IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Source JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV error.
    #[error("Source CSV error: {0}")]
    Csv(#[from] CsvError),

    /// The payload could not be assembled into a table.
    #[error("Source table error: {0}")]
    Table(#[from] CleanError),
}

// =============================================================================
// Loader Errors
// =============================================================================

/// Errors while writing cleaned tables to their destination.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error.
    #[error("Loader IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Loader JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("Loader CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable has a value the pipeline cannot use.
    #[error("Invalid value for {var}: {message}")]
    Invalid { var: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::run_pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Cleaning rule error.
    #[error("Clean error: {0}")]
    Clean(#[from] CleanError),

    /// Source adapter error.
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Loader error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// No source is configured at all.
    #[error("No sources configured")]
    NothingToRun,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server IO error.
    #[error("Server IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for cleaning rules.
pub type CleanResult<T> = Result<T, CleanError>;

/// Result type for source adapters.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type for the loader.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // CleanError -> PipelineError
        let clean_err = CleanError::MissingColumn("user_uuid".into());
        let pipeline_err: PipelineError = clean_err.into();
        assert!(pipeline_err.to_string().contains("user_uuid"));

        // CleanError -> ExtractError -> PipelineError
        let extract_err: ExtractError = CleanError::NotAnObject { row: 3 }.into();
        let pipeline_err: PipelineError = extract_err.into();
        assert!(pipeline_err.to_string().contains("Record 3"));
    }

    #[test]
    fn test_row_width_format() {
        let err = CleanError::RowWidth { expected: 4, found: 2 };
        let msg = err.to_string();
        assert!(msg.contains("2 values"));
        assert!(msg.contains("4 columns"));
    }
}
