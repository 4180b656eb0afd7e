//! Validation outcome types: error records, coerced rows and the
//! aggregate result returned by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable validation error codes.
///
/// Serialized in SCREAMING_SNAKE_CASE (`EMPTY_FILE`, `VALUE_TOO_LONG`, ...)
/// so API consumers can switch on them without string matching messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // structural
    EmptyFile,
    RowNotFound,
    InvalidDelimiter,
    MaxRowsExceeded,
    ParseError,
    // header contract
    MissingRequiredColumn,
    DuplicateColumn,
    ColumnOrderMismatch,
    UnexpectedColumn,
    // required values
    MissingRequiredValue,
    InvalidRequiredValue,
    // strings
    ValueTooShort,
    ValueTooLong,
    PatternMismatch,
    InvalidPattern,
    // numbers
    InvalidNumber,
    ValueTooSmall,
    ValueTooLarge,
    // dates
    DateFormatMismatch,
    InvalidDate,
    InvalidDatePattern,
    // booleans
    InvalidBoolean,
}

impl ErrorCode {
    /// The wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyFile => "EMPTY_FILE",
            Self::RowNotFound => "ROW_NOT_FOUND",
            Self::InvalidDelimiter => "INVALID_DELIMITER",
            Self::MaxRowsExceeded => "MAX_ROWS_EXCEEDED",
            Self::ParseError => "PARSE_ERROR",
            Self::MissingRequiredColumn => "MISSING_REQUIRED_COLUMN",
            Self::DuplicateColumn => "DUPLICATE_COLUMN",
            Self::ColumnOrderMismatch => "COLUMN_ORDER_MISMATCH",
            Self::UnexpectedColumn => "UNEXPECTED_COLUMN",
            Self::MissingRequiredValue => "MISSING_REQUIRED_VALUE",
            Self::InvalidRequiredValue => "INVALID_REQUIRED_VALUE",
            Self::ValueTooShort => "VALUE_TOO_SHORT",
            Self::ValueTooLong => "VALUE_TOO_LONG",
            Self::PatternMismatch => "PATTERN_MISMATCH",
            Self::InvalidPattern => "INVALID_PATTERN",
            Self::InvalidNumber => "INVALID_NUMBER",
            Self::ValueTooSmall => "VALUE_TOO_SMALL",
            Self::ValueTooLarge => "VALUE_TOO_LARGE",
            Self::DateFormatMismatch => "DATE_FORMAT_MISMATCH",
            Self::InvalidDate => "INVALID_DATE",
            Self::InvalidDatePattern => "INVALID_DATE_PATTERN",
            Self::InvalidBoolean => "INVALID_BOOLEAN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Validation Error Record
// =============================================================================

/// A single validation finding with its location context.
///
/// `line` is the 1-based physical line in the filtered file (header is
/// line 1). `row` is the 1-based data row, absent for file-level and
/// header-level findings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Offending column name, when the finding concerns one column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// 1-based data row number (first data row is 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// 1-based line number (header is line 1).
    pub line: usize,
    /// The offending raw value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// What a valid value would look like, when a hint exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_format: Option<String>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, line: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            column: None,
            row: None,
            line,
            value: None,
            expected_format: None,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_expected_format(mut self, expected: impl Into<String>) -> Self {
        self.expected_format = Some(expected.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] line {}", self.code, self.line)?;
        if let Some(row) = self.row {
            write!(f, ", row {}", row)?;
        }
        if let Some(ref column) = self.column {
            write!(f, ", column '{}'", column)?;
        }
        if let Some(ref value) = self.value {
            write!(f, " (value '{}')", value)?;
        }
        write!(f, ": {}", self.message)
    }
}

// =============================================================================
// Processed Rows
// =============================================================================

/// A data row after validation, with cell values coerced to JSON types.
///
/// The coerced cells are flattened into the object itself; bookkeeping
/// fields are prefixed with `_` to keep them out of the way of real
/// column names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedRow {
    /// Coerced values keyed by header name.
    #[serde(flatten)]
    pub values: Map<String, Value>,
    /// 1-based data row number.
    #[serde(rename = "_row_number")]
    pub row_number: usize,
    /// Whether any cell of this row failed validation.
    #[serde(rename = "_has_errors")]
    pub has_errors: bool,
}

// =============================================================================
// Aggregate Result
// =============================================================================

/// Complete outcome of validating one file against one schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the file is acceptable under the schema's acceptance policy.
    pub is_valid: bool,
    /// Every finding, in file order (header findings first).
    pub errors: Vec<ValidationError>,
    /// Rows that produced coerced output.
    pub processed_rows: Vec<ProcessedRow>,
    /// Number of data lines in the file (blank lines excluded).
    pub total_rows: usize,
    /// Number of rows with zero findings.
    pub valid_rows: usize,
}

impl ValidationResult {
    /// A rejected result with no processed rows.
    pub(crate) fn invalid(errors: Vec<ValidationError>, total_rows: usize) -> Self {
        Self {
            is_valid: false,
            errors,
            processed_rows: Vec::new(),
            total_rows,
            valid_rows: 0,
        }
    }

    /// Findings for one data row, in file order.
    pub fn errors_for_row(&self, row: usize) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.row == Some(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes_serialize_screaming_snake() {
        let json = serde_json::to_value(ErrorCode::MissingRequiredColumn).unwrap();
        assert_eq!(json, json!("MISSING_REQUIRED_COLUMN"));
        assert_eq!(ErrorCode::ValueTooLong.as_str(), "VALUE_TOO_LONG");

        // serde and as_str must agree
        let codes = [
            ErrorCode::EmptyFile,
            ErrorCode::RowNotFound,
            ErrorCode::InvalidDelimiter,
            ErrorCode::MaxRowsExceeded,
            ErrorCode::ParseError,
            ErrorCode::MissingRequiredColumn,
            ErrorCode::DuplicateColumn,
            ErrorCode::ColumnOrderMismatch,
            ErrorCode::UnexpectedColumn,
            ErrorCode::MissingRequiredValue,
            ErrorCode::InvalidRequiredValue,
            ErrorCode::ValueTooShort,
            ErrorCode::ValueTooLong,
            ErrorCode::PatternMismatch,
            ErrorCode::InvalidPattern,
            ErrorCode::InvalidNumber,
            ErrorCode::ValueTooSmall,
            ErrorCode::ValueTooLarge,
            ErrorCode::DateFormatMismatch,
            ErrorCode::InvalidDate,
            ErrorCode::InvalidDatePattern,
            ErrorCode::InvalidBoolean,
        ];
        for code in codes {
            assert_eq!(serde_json::to_value(code).unwrap(), json!(code.as_str()));
        }
    }

    #[test]
    fn test_error_builder_and_display() {
        let err = ValidationError::new(ErrorCode::InvalidNumber, 5, "Not a number")
            .with_row(4)
            .with_column("age")
            .with_value("abc")
            .with_expected_format("123 or 123.45");

        let msg = err.to_string();
        assert!(msg.contains("[INVALID_NUMBER]"));
        assert!(msg.contains("line 5"));
        assert!(msg.contains("row 4"));
        assert!(msg.contains("column 'age'"));
        assert!(msg.contains("value 'abc'"));
        assert!(msg.contains("Not a number"));
    }

    #[test]
    fn test_error_serde_omits_empty_context() {
        let err = ValidationError::new(ErrorCode::EmptyFile, 0, "File is empty");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "EMPTY_FILE");
        assert_eq!(json["line"], 0);
        assert!(json.get("column").is_none());
        assert!(json.get("row").is_none());
        assert!(json.get("expectedFormat").is_none());
    }

    #[test]
    fn test_processed_row_flattens_values() {
        let mut values = Map::new();
        values.insert("name".into(), json!("Alice"));
        values.insert("age".into(), json!(30.0));
        let row = ProcessedRow {
            values,
            row_number: 1,
            has_errors: false,
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["age"], 30.0);
        assert_eq!(json["_row_number"], 1);
        assert_eq!(json["_has_errors"], false);
    }

    #[test]
    fn test_errors_for_row() {
        let result = ValidationResult {
            is_valid: false,
            errors: vec![
                ValidationError::new(ErrorCode::DuplicateColumn, 1, "dup"),
                ValidationError::new(ErrorCode::InvalidNumber, 2, "bad").with_row(1),
                ValidationError::new(ErrorCode::InvalidDate, 3, "bad").with_row(2),
            ],
            processed_rows: vec![],
            total_rows: 2,
            valid_rows: 0,
        };

        assert_eq!(result.errors_for_row(1).len(), 1);
        assert_eq!(result.errors_for_row(1)[0].code, ErrorCode::InvalidNumber);
        assert!(result.errors_for_row(9).is_empty());
    }
}
