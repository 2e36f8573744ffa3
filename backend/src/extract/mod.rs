//! Source adapters.
//!
//! Thin collaborators that hand raw tables to the cleaners:
//!
//! - [`read_table_file`] - local CSV/JSON exports of database tables and the
//!   card document
//! - [`StoresApi`] - the paginated stores API
//! - [`fetch_csv`] - the product catalogue CSV in object storage
//! - [`fetch_json_feed`] - the sale date/time JSON feed
//!
//! Locations starting with `http://` or `https://` are downloaded, anything
//! else is read from disk.

use serde_json::Value;
use std::path::Path;

use crate::api::logs::{log_info, log_info_indent, log_success};
use crate::error::{ExtractError, ExtractResult};
use crate::parser::parse_bytes_auto;
use crate::table::Table;

/// Serialisation of a tabular source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Guess the format from a file name, path or URL.
    pub fn from_location(location: &str) -> ExtractResult<Self> {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(ExtractError::UnsupportedFormat(location.to_string())),
        }
    }
}

/// True for locations that must be fetched over HTTP.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Build a table from raw bytes in the given format.
pub fn table_from_bytes(bytes: &[u8], format: SourceFormat) -> ExtractResult<Table> {
    match format {
        SourceFormat::Csv => Ok(parse_bytes_auto(bytes)?.table),
        SourceFormat::Json => {
            let value: Value = serde_json::from_slice(bytes)?;
            Ok(Table::from_json(&value)?)
        }
    }
}

/// Read a local `.csv` or `.json` export as a table.
pub fn read_table_file<P: AsRef<Path>>(path: P) -> ExtractResult<Table> {
    let path = path.as_ref();
    let format = SourceFormat::from_location(&path.to_string_lossy())?;
    let bytes = std::fs::read(path)?;
    let table = table_from_bytes(&bytes, format)?;
    log_info_indent(format!("Read {} rows from {}", table.len(), path.display()), 1);
    Ok(table)
}

async fn fetch_bytes(url: &str) -> ExtractResult<Vec<u8>> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Load a CSV from object storage (public HTTPS URL) or a local path.
pub async fn fetch_csv(location: &str) -> ExtractResult<Table> {
    if !is_remote(location) {
        return read_table_file(location);
    }
    log_info(format!("Downloading {}", location));
    let bytes = fetch_bytes(location).await?;
    let table = table_from_bytes(&bytes, SourceFormat::Csv)?;
    log_success(format!("Downloaded {} rows", table.len()));
    Ok(table)
}

/// Load a JSON feed, either an array of records or a column-oriented object.
pub async fn fetch_json_feed(location: &str) -> ExtractResult<Table> {
    if !is_remote(location) {
        return read_table_file(location);
    }
    log_info(format!("Downloading {}", location));
    let bytes = fetch_bytes(location).await?;
    let table = table_from_bytes(&bytes, SourceFormat::Json)?;
    log_success(format!("Downloaded {} rows", table.len()));
    Ok(table)
}

// =============================================================================
// Stores API
// =============================================================================

/// Client for the paginated stores API.
///
/// Every request carries the `x-api-key` header.
#[derive(Clone)]
pub struct StoresApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StoresApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn number_of_stores_url(&self) -> String {
        format!("{}/number_stores", self.base_url)
    }

    pub fn store_url(&self, index: usize) -> String {
        format!("{}/store_details/{}", self.base_url, index)
    }

    async fn get_json(&self, url: &str) -> ExtractResult<Value> {
        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Value>().await?)
    }

    /// Number of stores the API serves.
    pub async fn number_of_stores(&self) -> ExtractResult<usize> {
        let body = self.get_json(&self.number_of_stores_url()).await?;
        read_store_count(&body)
    }

    /// Fetch stores `0..count`, one request each, as a single table.
    ///
    /// The first record fixes the columns.
    pub async fn retrieve_stores(&self, count: usize) -> ExtractResult<Table> {
        log_info(format!("Retrieving {} stores", count));
        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            records.push(self.get_json(&self.store_url(index)).await?);
            if (index + 1) % 100 == 0 {
                log_info_indent(format!("{}/{} stores", index + 1, count), 1);
            }
        }
        let table = Table::from_records(&records)?;
        log_success(format!("Retrieved {} stores", table.len()));
        Ok(table)
    }
}

fn read_store_count(body: &Value) -> ExtractResult<usize> {
    body.get("number_stores")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .ok_or_else(|| ExtractError::MissingField("number_stores".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_source_format() {
        assert_eq!(SourceFormat::from_location("users.CSV").unwrap(), SourceFormat::Csv);
        assert_eq!(
            SourceFormat::from_location("https://host/date_details.json?x=1").unwrap(),
            SourceFormat::Json
        );
        assert!(matches!(
            SourceFormat::from_location("card_details.pdf"),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/products.csv"));
        assert!(!is_remote("data/products.csv"));
    }

    #[test]
    fn test_read_csv_and_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("orders.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        writeln!(file, "index,product_quantity\n0,3\n1,").unwrap();
        let table = read_table_file(&csv_path).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.cell(1, "product_quantity").is_none());

        let json_path = dir.path().join("dates.json");
        std::fs::write(&json_path, r#"{"month": {"0": "9"}, "year": {"0": "2012"}}"#).unwrap();
        let table = read_table_file(&json_path).unwrap();
        assert_eq!(table.cell(0, "year"), Some(&Cell::text("2012")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            read_table_file("/definitely/not/here.csv"),
            Err(ExtractError::IoError(_))
        ));
    }

    #[test]
    fn test_store_urls() {
        let api = StoresApi::new("https://api.example.com/prod/", "key");
        assert_eq!(api.number_of_stores_url(), "https://api.example.com/prod/number_stores");
        assert_eq!(api.store_url(7), "https://api.example.com/prod/store_details/7");
    }

    #[test]
    fn test_read_store_count() {
        assert_eq!(read_store_count(&json!({"statusCode": 200, "number_stores": 451})).unwrap(), 451);
        assert!(matches!(
            read_store_count(&json!({"statusCode": 200})),
            Err(ExtractError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn test_local_locations_bypass_http() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        std::fs::write(&path, "weight,uuid\n400g,a\n").unwrap();

        let table = fetch_csv(&path.to_string_lossy()).await.unwrap();
        assert_eq!(table.len(), 1);
    }
}
