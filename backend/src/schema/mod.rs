//! Schema model for delimited file validation.
//!
//! This module contains the data structures that describe *what a valid
//! file looks like*:
//!
//! - [`DataType`] - the five supported column types
//! - [`ColumnSchema`] - per-column rules (type, required, length/range/pattern)
//! - [`ValidationConfig`] - file-level parsing and acceptance settings
//! - [`SchemaDefinition`] - a named, serializable bundle of config + columns
//!
//! # Embedded Contract
//!
//! Schema definition documents exchanged over the API or stored in the
//! registry are checked against a JSON Schema Draft 7 contract embedded at
//! compile time from `schemas/schema-definition.json`. Use
//! [`validate_definition`] to get per-violation messages, or
//! [`is_valid_definition`] for a quick boolean check.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};

// =============================================================================
// Data Types
// =============================================================================

/// Supported column data types.
///
/// `Email` values are validated as strings (length, pattern); the email
/// shape itself is expressed through the column's `pattern`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Free-form text.
    String,
    /// Decimal number, validated as `f64`.
    Number,
    /// Calendar date, optionally constrained by a template pattern.
    Date,
    /// Boolean in one of the accepted spellings (true/false/1/0/yes/no/y/n).
    Boolean,
    /// Email address, treated as a string with a caller-supplied pattern.
    Email,
}

impl DataType {
    /// Lowercase name as it appears in schema definition documents.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Email => "email",
        }
    }
}

// =============================================================================
// Column Schema
// =============================================================================

/// Validation rules for a single column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    /// Header name as it appears in the file.
    pub name: String,
    /// Human-readable label used in error messages.
    pub display_name: String,
    /// Data type applied to every cell of this column.
    pub data_type: DataType,
    /// Whether cells in this column must be non-empty.
    #[serde(default)]
    pub required: bool,
    /// Expected zero-based position in the header row.
    pub position: u32,
    /// Minimum length in characters (string/email).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length in characters (string/email).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Minimum numeric value (number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Maximum numeric value (number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Regular expression (string/email) or date template (date).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ColumnSchema {
    /// Create a column with the minimal required fields.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        data_type: DataType,
        position: u32,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            data_type,
            required: false,
            position,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            pattern: None,
        }
    }

    /// Mark the column as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Constrain character length.
    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    /// Constrain numeric range.
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    /// Attach a pattern (regex for strings, template for dates).
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

// =============================================================================
// Validation Config
// =============================================================================

/// File-level parsing and acceptance settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Single-character field separator.
    pub delimiter: char,
    /// Accept files where only some rows validate.
    #[serde(default)]
    pub allow_partial_upload: bool,
    /// Maximum number of data rows accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            allow_partial_upload: false,
            max_rows: None,
        }
    }
}

impl ValidationConfig {
    /// Reject delimiters the splitter and the CSV export cannot represent.
    pub fn check_delimiter(&self) -> SchemaResult<()> {
        let d = self.delimiter;
        if !d.is_ascii() || d == '"' || d == '\r' || d == '\n' {
            return Err(SchemaError::InvalidDelimiter(d));
        }
        Ok(())
    }
}

// =============================================================================
// Schema Definition
// =============================================================================

/// A named validation schema: config plus an ordered list of columns.
///
/// This is the unit that gets stored in the registry, shipped over the
/// API and fed to [`crate::validator::Validator::new`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    /// Human-readable schema name.
    pub name: String,
    /// File-level settings.
    pub config: ValidationConfig,
    /// Column rules, in expected file order.
    pub columns: Vec<ColumnSchema>,
}

impl SchemaDefinition {
    /// Parse a definition from a JSON string, checking the embedded
    /// contract first so malformed documents fail with readable messages.
    pub fn from_json(json: &str) -> Result<Self, Vec<String>> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| vec![format!("Invalid JSON: {}", e)])?;
        validate_definition(&value)?;
        serde_json::from_value(value).map_err(|e| vec![format!("Invalid definition: {}", e)])
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// =============================================================================
// Definition Contract (JSON Schema Draft 7)
// =============================================================================

/// Validate a JSON object against a JSON schema.
///
/// Returns `Ok(())` when valid, or every violation message when not.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick true/false check against a JSON schema.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a document against the embedded schema-definition contract.
pub fn validate_definition(data: &Value) -> Result<(), Vec<String>> {
    let schema: Value =
        serde_json::from_str(include_str!("../../schemas/schema-definition.json"))
            .expect("Invalid embedded schema");
    validate(&schema, data)
}

/// Quick check against the embedded schema-definition contract.
pub fn is_valid_definition(data: &Value) -> bool {
    let schema: Value =
        serde_json::from_str(include_str!("../../schemas/schema-definition.json"))
            .expect("Invalid embedded schema");
    is_valid(&schema, data)
}

/// Build the example definition shipped with the CLI (`tabcheck example-schema`).
pub fn example_definition() -> SchemaDefinition {
    SchemaDefinition {
        name: "Customer import".into(),
        config: ValidationConfig {
            delimiter: ',',
            allow_partial_upload: true,
            max_rows: Some(10_000),
        },
        columns: vec![
            ColumnSchema::new("name", "Full name", DataType::String, 0)
                .required()
                .with_length(Some(2), Some(80)),
            ColumnSchema::new("email", "Email address", DataType::Email, 1)
                .required()
                .with_pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
            ColumnSchema::new("age", "Age", DataType::Number, 2)
                .with_range(Some(0.0), Some(150.0)),
            ColumnSchema::new("signup_date", "Signup date", DataType::Date, 3)
                .with_pattern("YYYY-MM-DD"),
            ColumnSchema::new("newsletter", "Newsletter opt-in", DataType::Boolean, 4),
        ],
    }
}

// =============================================================================
// Tests
// =============================================================================
