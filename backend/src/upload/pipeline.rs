//! High-level upload pipeline: decode, validate, persist.
//!
//! This is the path an uploaded file takes from raw bytes to an API
//! response: encoding detection and decoding, schema validation, and
//! (for accepted uploads) export of the clean rows to blob storage.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabcheck::upload::process_upload;
//! use tabcheck::schema::example_definition;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("customers.csv")?;
//!     let outcome = process_upload(&bytes, &example_definition(), None).await?;
//!     println!("{}: {} valid rows", outcome.status, outcome.result.valid_rows);
//!     Ok(())
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::export::rows_to_csv;
use crate::api::logs::{log_error, log_error_indent, log_info, log_success, log_warning};
use crate::error::UploadResult;
use crate::parser::{decode_content, detect_encoding};
use crate::schema::SchemaDefinition;
use crate::storage::BlobStore;
use crate::validator::{ValidationResult, Validator};

/// How the upload fared against the schema's acceptance policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Every row validated.
    Accepted,
    /// Accepted with findings (partial uploads enabled, some rows clean).
    Partial,
    /// Not acceptable under the schema.
    Rejected,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Partial => "partial",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a complete upload pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// Acceptance status.
    pub status: UploadStatus,
    /// URL of the stored clean-row export, when one was persisted.
    pub file_url: Option<String>,
    /// Detected input encoding.
    pub encoding: String,
    /// Delimiter the schema prescribed.
    pub delimiter: char,
    /// Name of the schema the file was validated against.
    pub schema_name: String,
    /// The full validation result.
    pub result: ValidationResult,
}

/// Run the upload pipeline on raw file bytes.
///
/// 1. Detects the encoding and decodes to text
/// 2. Validates against `definition`
/// 3. For accepted and partial uploads, exports the clean rows and
///    persists them through `store` (when one is given)
///
/// Validation findings end up inside the outcome; an `Err` here means
/// the schema itself was unusable or persistence failed.
pub async fn process_upload(
    bytes: &[u8],
    definition: &SchemaDefinition,
    store: Option<&dyn BlobStore>,
) -> UploadResult<UploadOutcome> {
    log_info(format!("📄 Upload received ({} bytes)", bytes.len()));

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    log_success(format!("Decoded as {}", encoding));

    let validator = Validator::new(definition.config.clone(), definition.columns.clone())?;
    log_info(format!(
        "🔍 Validating against '{}' ({} columns)",
        definition.name,
        validator.columns().len()
    ));

    let result = validator.validate_content(&content);
    let status = status_for(&result);

    match status {
        UploadStatus::Accepted => {
            log_success(format!("All {} row(s) valid", result.valid_rows));
        }
        UploadStatus::Partial => {
            log_warning(format!(
                "{} of {} row(s) valid, {} finding(s)",
                result.valid_rows,
                result.total_rows,
                result.errors.len()
            ));
        }
        UploadStatus::Rejected => {
            log_error(format!("Upload rejected with {} finding(s)", result.errors.len()));
            for err in result.errors.iter().take(5) {
                log_error_indent(err.to_string(), 1);
            }
            if result.errors.len() > 5 {
                log_error_indent(format!("... and {} more", result.errors.len() - 5), 1);
            }
        }
    }

    let mut file_url = None;
    if status != UploadStatus::Rejected && !result.processed_rows.is_empty() {
        if let Some(store) = store {
            let export = rows_to_csv(
                validator.columns(),
                &result.processed_rows,
                definition.config.delimiter,
            )?;
            let key = format!("{}.csv", Uuid::new_v4());
            let url = store.put(&key, &export).await?;
            log_success(format!("Stored {} clean row(s) at {}", result.valid_rows, url));
            file_url = Some(url);
        }
    }

    Ok(UploadOutcome {
        status,
        file_url,
        encoding,
        delimiter: definition.config.delimiter,
        schema_name: definition.name.clone(),
        result,
    })
}

fn status_for(result: &ValidationResult) -> UploadStatus {
    if !result.is_valid {
        UploadStatus::Rejected
    } else if result.errors.is_empty() {
        UploadStatus::Accepted
    } else {
        UploadStatus::Partial
    }
}
