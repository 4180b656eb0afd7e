//! The validation engine: header contract plus row-by-row cell checks.

use std::collections::{HashMap, HashSet};

use serde_json::Map;

use super::cells::{coerce_value, validate_cell};
use super::result::{ErrorCode, ProcessedRow, ValidationError, ValidationResult};
use crate::error::{SchemaError, SchemaResult};
use crate::parser::{content_lines, split_line};
use crate::schema::{ColumnSchema, ValidationConfig};

/// Validates delimited file content against one schema.
///
/// Construction checks the schema itself (usable delimiter, at least
/// one column, unique column names) so that a `Validator` in hand is
/// always safe to run. Validation itself never fails: every problem
/// with the *file* is reported inside the returned
/// [`ValidationResult`].
///
/// # Example
/// ```ignore
/// use tabcheck::{ColumnSchema, DataType, ValidationConfig, Validator};
///
/// let validator = Validator::new(
///     ValidationConfig::default(),
///     vec![
///         ColumnSchema::new("name", "Name", DataType::String, 0).required(),
///         ColumnSchema::new("age", "Age", DataType::Number, 1),
///     ],
/// )?;
/// let result = validator.validate_content("name,age\nAlice,30\n");
/// assert!(result.is_valid);
/// ```
#[derive(Debug)]
pub struct Validator {
    config: ValidationConfig,
    /// Columns sorted by their declared position.
    columns: Vec<ColumnSchema>,
    /// Column name -> index into `columns`.
    by_name: HashMap<String, usize>,
}

impl Validator {
    /// Build a validator, rejecting unusable schemas.
    pub fn new(config: ValidationConfig, columns: Vec<ColumnSchema>) -> SchemaResult<Self> {
        config.check_delimiter()?;

        if columns.is_empty() {
            return Err(SchemaError::EmptyColumns);
        }

        let mut columns = columns;
        columns.sort_by_key(|c| c.position);

        let mut by_name = HashMap::new();
        for (i, column) in columns.iter().enumerate() {
            if by_name.insert(column.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(Self {
            config,
            columns,
            by_name,
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Columns in expected file order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Validate a whole file.
    ///
    /// Line numbers count non-blank lines only, with the header as
    /// line 1; row numbers count data rows from 1.
    pub fn validate_content(&self, content: &str) -> ValidationResult {
        let lines = content_lines(content);

        if lines.is_empty() {
            return ValidationResult::invalid(
                vec![ValidationError::new(ErrorCode::EmptyFile, 0, "File is empty")],
                0,
            );
        }

        if lines.len() == 1 {
            return ValidationResult::invalid(
                vec![ValidationError::new(
                    ErrorCode::RowNotFound,
                    1,
                    "No data rows found in the file",
                )],
                0,
            );
        }

        let total_rows = lines.len() - 1;

        if !lines[0].contains(self.config.delimiter) {
            return ValidationResult::invalid(
                vec![ValidationError::new(
                    ErrorCode::InvalidDelimiter,
                    1,
                    format!(
                        "Header line does not contain the delimiter {:?}",
                        self.config.delimiter
                    ),
                )],
                total_rows,
            );
        }

        let headers = match split_line(lines[0], self.config.delimiter) {
            Ok(headers) => headers,
            Err(err) => {
                return ValidationResult::invalid(
                    vec![ValidationError::new(
                        ErrorCode::ParseError,
                        1,
                        format!("Could not parse header line: {}", err),
                    )],
                    total_rows,
                );
            }
        };

        let mut errors = self.validate_headers(&headers);
        if !errors.is_empty() && !self.config.allow_partial_upload {
            return ValidationResult::invalid(errors, total_rows);
        }

        if let Some(max_rows) = self.config.max_rows {
            if total_rows > max_rows {
                errors.push(ValidationError::new(
                    ErrorCode::MaxRowsExceeded,
                    1,
                    format!(
                        "File has {} data rows, exceeding the limit of {}",
                        total_rows, max_rows
                    ),
                ));
                return ValidationResult::invalid(errors, total_rows);
            }
        }

        let mut processed_rows = Vec::new();
        let mut valid_rows = 0;

        for (i, line) in lines[1..].iter().enumerate() {
            let row_number = i + 1;
            let line_number = i + 2;

            let cells = match split_line(line, self.config.delimiter) {
                Ok(cells) => cells,
                Err(err) => {
                    errors.push(
                        ValidationError::new(
                            ErrorCode::ParseError,
                            line_number,
                            format!("Could not parse line: {}", err),
                        )
                        .with_row(row_number),
                    );
                    continue;
                }
            };

            let (row_errors, values) = self.validate_row(&headers, &cells, row_number, line_number);

            if row_errors.is_empty() {
                processed_rows.push(ProcessedRow {
                    values,
                    row_number,
                    has_errors: false,
                });
                valid_rows += 1;
            } else {
                let coerced_any = !values.is_empty();
                errors.extend(row_errors);
                // partially valid rows are still worth returning when the
                // schema tolerates partial uploads
                if self.config.allow_partial_upload && coerced_any {
                    processed_rows.push(ProcessedRow {
                        values,
                        row_number,
                        has_errors: true,
                    });
                }
            }
        }

        let is_valid = errors.is_empty() || (self.config.allow_partial_upload && valid_rows > 0);

        ValidationResult {
            is_valid,
            errors,
            processed_rows,
            total_rows,
            valid_rows,
        }
    }

    /// Check the header row against the schema contract.
    ///
    /// All findings carry line 1 and no row number.
    fn validate_headers(&self, headers: &[String]) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // every required column must be present
        for column in self.columns.iter().filter(|c| c.required) {
            if !headers.iter().any(|h| h == &column.name) {
                errors.push(
                    ValidationError::new(
                        ErrorCode::MissingRequiredColumn,
                        1,
                        format!(
                            "Required column '{}' ({}) is missing from the headers",
                            column.display_name, column.name
                        ),
                    )
                    .with_column(column.name.clone()),
                );
            }
        }

        // duplicated headers, one finding per name in first-seen order
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for header in headers {
            *counts.entry(header.as_str()).or_insert(0) += 1;
        }
        let mut reported = HashSet::new();
        for header in headers {
            let count = counts[header.as_str()];
            if count > 1 && reported.insert(header.as_str()) {
                errors.push(
                    ValidationError::new(
                        ErrorCode::DuplicateColumn,
                        1,
                        format!("Column '{}' appears {} times in the headers", header, count),
                    )
                    .with_column(header.clone()),
                );
            }
        }

        // relative order of the columns both sides know about
        let expected: Vec<&str> = self
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| headers.iter().any(|h| h == name))
            .collect();
        let mut seen = HashSet::new();
        let found: Vec<&str> = headers
            .iter()
            .map(String::as_str)
            .filter(|h| self.by_name.contains_key(*h) && seen.insert(*h))
            .collect();

        if expected.iter().zip(found.iter()).any(|(e, f)| e != f) {
            errors.push(ValidationError::new(
                ErrorCode::ColumnOrderMismatch,
                1,
                format!(
                    "Column order mismatch: expected [{}], found [{}]",
                    expected.join(", "),
                    found.join(", ")
                ),
            ));
        }

        errors
    }

    /// Validate one data row cell by cell.
    ///
    /// Returns the row's findings plus the coerced values of its clean
    /// cells. Cells beyond the header width are ignored; headers beyond
    /// the row width read as empty cells.
    fn validate_row(
        &self,
        headers: &[String],
        cells: &[String],
        row_number: usize,
        line_number: usize,
    ) -> (Vec<ValidationError>, Map<String, serde_json::Value>) {
        let mut row_errors: Vec<ValidationError> = Vec::new();
        let mut values = Map::new();

        for (i, header) in headers.iter().enumerate() {
            let raw = cells.get(i).map(String::as_str).unwrap_or("");

            match self.by_name.get(header.as_str()) {
                Some(&column_index) => {
                    let column = &self.columns[column_index];
                    let cell_errors = validate_cell(column, raw, row_number, line_number);
                    if cell_errors.is_empty() {
                        values.insert(header.clone(), coerce_value(column.data_type, raw));
                    } else {
                        row_errors.extend(cell_errors);
                    }
                }
                None => {
                    // a header duplicated in the row produces one finding, not two
                    let already_flagged = row_errors.iter().any(|e| {
                        e.code == ErrorCode::UnexpectedColumn
                            && e.column.as_deref() == Some(header.as_str())
                    });
                    if !already_flagged {
                        row_errors.push(
                            ValidationError::new(
                                ErrorCode::UnexpectedColumn,
                                line_number,
                                format!("Column '{}' is not defined in the schema", header),
                            )
                            .with_row(row_number)
                            .with_column(header.clone()),
                        );
                    }
                }
            }
        }

        (row_errors, values)
    }
}
