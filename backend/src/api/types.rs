//! REST API response types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::load::destination_for;
use crate::models::Entity;
use crate::pipeline::CleanOutput;

/// Response to a clean request: the cleaned records plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready" when rows survived, "empty" when every row was dropped
    pub status: String,

    /// Cleaned rows, missing values as `null`
    pub records: Vec<Value>,

    pub metadata: CleanMetadata,
}

/// Metadata about a clean request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanMetadata {
    pub entity: Entity,
    pub rows_in: usize,
    pub rows_out: usize,
    pub rows_dropped: usize,
    pub columns: Vec<String>,
    /// Warehouse table the cleaned rows belong in
    pub destination: String,
}

impl From<CleanOutput> for CleanResponse {
    fn from(output: CleanOutput) -> Self {
        let rows_out = output.rows_out();
        let destination = destination_for(output.entity.clean_table_name());

        CleanResponse {
            job_id: Uuid::new_v4().to_string(),
            status: (if rows_out == 0 { "empty" } else { "ready" }).to_string(),
            records: output.table.to_records(),
            metadata: CleanMetadata {
                entity: output.entity,
                rows_in: output.rows_in,
                rows_out,
                rows_dropped: output.rows_in.saturating_sub(rows_out),
                columns: output.table.columns().to_vec(),
                destination: destination.table.to_string(),
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "records": [],
        "metadata": null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn test_response_from_output() {
        let table = Table::from_records(&[serde_json::json!({"date_uuid": "x", "month": "9"})]).unwrap();
        let output = CleanOutput {
            entity: Entity::SaleTimes,
            rows_in: 3,
            table,
        };

        let response = CleanResponse::from(output);
        assert_eq!(response.status, "ready");
        assert_eq!(response.metadata.rows_dropped, 2);
        assert_eq!(response.metadata.destination, "dim_date_times");

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["metadata"]["entity"], "sale_times");
        assert_eq!(value["metadata"]["rowsIn"], 3);
        assert_eq!(value["records"][0]["month"], "9");
    }

    #[test]
    fn test_error_response() {
        let value = error_response("No file provided");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "No file provided");
    }
}
