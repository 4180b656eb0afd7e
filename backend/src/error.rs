//! Error types for the Tabcheck validation pipeline.
//!
//! This module defines a hierarchy of error types following best practices:
//!
//! - [`SchemaError`] - Schema construction errors
//! - [`StorageError`] - Blob storage errors
//! - [`RegistryError`] - Schema registry errors
//! - [`UploadError`] - Top-level upload pipeline errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Note that per-cell validation findings (bad dates, short values, ...)
//! are *data*, not errors: they are collected as
//! [`crate::validator::ValidationError`] records inside a
//! [`crate::validator::ValidationResult`] rather than raised through `?`.

use thiserror::Error;

// =============================================================================
// Schema Construction Errors
// =============================================================================

/// Errors raised when a validator is built from an unusable schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema defines no columns at all.
    #[error("Schema defines no columns")]
    EmptyColumns,

    /// Two columns share the same name.
    #[error("Duplicate column name in schema: '{0}'")]
    DuplicateColumn(String),

    /// Delimiter cannot be used to split fields.
    #[error("Invalid delimiter {0:?}: must be a printable ASCII character other than '\"'")]
    InvalidDelimiter(char),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from blob storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key contains path separators or parent references.
    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),

    /// IO error.
    #[error("Storage IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the schema registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Schema not found.
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// Document does not satisfy the schema-definition contract.
    #[error("Invalid schema definition: {0}")]
    InvalidDefinition(String),

    /// IO error.
    #[error("Registry IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Registry JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Upload Pipeline Errors (top-level)
// =============================================================================

/// Top-level upload pipeline errors.
///
/// This is the main error type returned by [`crate::upload::process_upload`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Schema construction error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Accepted rows could not be rendered back to delimited text.
    #[error("Export error: {0}")]
    Export(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Upload pipeline error.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Registry error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for schema construction.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for upload pipeline operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SchemaError -> UploadError
        let schema_err = SchemaError::EmptyColumns;
        let upload_err: UploadError = schema_err.into();
        assert!(upload_err.to_string().contains("no columns"));

        // UploadError -> ServerError
        let upload_err = UploadError::Export("broken writer".into());
        let server_err: ServerError = upload_err.into();
        assert!(server_err.to_string().contains("broken writer"));

        // RegistryError -> ServerError
        let registry_err = RegistryError::NotFound("orders-2024".into());
        let server_err: ServerError = registry_err.into();
        assert!(server_err.to_string().contains("orders-2024"));
    }

    #[test]
    fn test_schema_error_format() {
        let err = SchemaError::DuplicateColumn("email".into());
        assert!(err.to_string().contains("email"));

        let err = SchemaError::InvalidDelimiter('\n');
        assert!(err.to_string().contains("delimiter"));
    }
}
