//! # Tabcheck - Schema-driven validation for delimited file uploads
//!
//! Tabcheck checks CSV and other delimited files against a column schema
//! (types, ranges, patterns, date templates) and reports every finding with
//! its line, row and column, so upload UIs can show users exactly what to fix.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Raw bytes  │────▶│   Parser    │────▶│  Validator  │────▶│  Clean CSV  │
//! │ (any enc.)  │     │ (auto-enc)  │     │  (schema)   │     │  + report   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabcheck::{example_definition, Validator};
//!
//! fn main() {
//!     let definition = example_definition();
//!     let validator = Validator::new(definition.config, definition.columns).unwrap();
//!     let result = validator.validate_content("name,email\nAda,ada@example.com\n");
//!     println!("valid: {} ({} rows)", result.is_valid, result.valid_rows);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`schema`] - Column schemas and validation configs
//! - [`parser`] - Line splitting, encoding and delimiter detection
//! - [`validator`] - Header contract and per-cell validation
//! - [`storage`] - Blob storage for accepted uploads
//! - [`registry`] - Stored schema definitions with usage stats
//! - [`upload`] - End-to-end upload pipeline and CSV export
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod schema;

// Parsing
pub mod parser;

// Validation
pub mod validator;

// Storage
pub mod storage;

// Schema registry
pub mod registry;

// Upload pipeline
pub mod upload;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    RegistryError,
    SchemaError,
    ServerError,
    StorageError,
    UploadError,
};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{
    ColumnSchema,
    DataType,
    SchemaDefinition,
    ValidationConfig,
    example_definition,
    is_valid,
    is_valid_definition,
    validate,
    validate_definition,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    content_lines,
    decode_content,
    detect_delimiter,
    detect_encoding,
    split_line,
    SplitError,
};

// =============================================================================
// Re-exports - Validator
// =============================================================================

pub use validator::{
    ErrorCode,
    ProcessedRow,
    ValidationError,
    ValidationResult,
    Validator,
};

// =============================================================================
// Re-exports - Storage
// =============================================================================

pub use storage::{BlobStore, LocalBlobStore};

// =============================================================================
// Re-exports - Registry
// =============================================================================

pub use registry::{SchemaRegistry, StoredSchema, DEFAULT_REGISTRY_DIR};

// =============================================================================
// Re-exports - Upload pipeline
// =============================================================================

pub use upload::{process_upload, rows_to_csv, UploadOutcome, UploadStatus};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    error_response,
    FileMetadata,
    ResponseMetadata,
    SchemaSummary,
    UploadResponse,
    ValidationStats,
};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
