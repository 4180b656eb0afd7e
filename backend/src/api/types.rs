//! REST API types for upload and validation responses.
//!
//! Everything here serializes in camelCase; validation errors keep
//! their structured shape (code, line, row, column, value) end to end
//! so clients can build per-cell feedback without parsing messages.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::upload::UploadOutcome;
use crate::validator::{ProcessedRow, ValidationError};

/// Response sent to clients after an upload or validate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "accepted", "partial", "rejected"
    pub status: String,

    /// URL of the stored clean-row export, when one was persisted
    pub file_url: Option<String>,

    /// Every validation finding, in file order
    pub errors: Vec<ValidationError>,

    /// Coerced rows (clean rows, plus flagged rows on partial uploads)
    pub processed_rows: Vec<ProcessedRow>,

    /// Metadata about the upload
    pub metadata: ResponseMetadata,
}

/// Metadata about the upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// File info
    pub file: FileMetadata,

    /// Validation stats
    pub validation: ValidationStats,

    /// Schema info
    pub schema: SchemaSummary,
}

/// Uploaded file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Client-supplied file name, when the multipart part carried one
    pub name: Option<String>,
    pub encoding: String,
    pub delimiter: String,
}

/// Validation statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub error_count: usize,
}

/// The schema the file was validated against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    /// Registry ID, absent for inline definitions
    pub id: Option<String>,
    pub name: String,
}

impl UploadResponse {
    /// Build a response from a pipeline outcome plus request context.
    pub fn from_outcome(
        outcome: UploadOutcome,
        file_name: Option<String>,
        schema_id: Option<String>,
    ) -> Self {
        // taken before the findings move into the response body
        let error_count = outcome.result.errors.len();
        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: outcome.status.as_str().to_string(),
            file_url: outcome.file_url,
            errors: outcome.result.errors,
            processed_rows: outcome.result.processed_rows,
            metadata: ResponseMetadata {
                file: FileMetadata {
                    name: file_name,
                    encoding: outcome.encoding,
                    delimiter: outcome.delimiter.to_string(),
                },
                validation: ValidationStats {
                    total_rows: outcome.result.total_rows,
                    valid_rows: outcome.result.valid_rows,
                    error_count,
                },
                schema: SchemaSummary {
                    id: schema_id,
                    name: outcome.schema_name,
                },
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
        "errors": [],
        "processedRows": [],
        "metadata": null
    })
}
