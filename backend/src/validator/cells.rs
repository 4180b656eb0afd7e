//! Per-cell validation and coercion.
//!
//! One entry point, [`validate_cell`], runs the required-value gate
//! once and then dispatches on the column's data type. Coercion via
//! [`coerce_value`] only happens for cells that validated cleanly, so
//! downstream consumers never see half-typed data.

use regex::Regex;
use serde_json::{Number, Value};

use super::dates::{self, GENERIC_SHAPES_HINT};
use super::result::{ErrorCode, ValidationError};
use crate::schema::{ColumnSchema, DataType};

/// Spellings accepted for boolean cells, compared case-insensitively.
const BOOLEAN_SPELLINGS: [&str; 8] = ["true", "false", "1", "0", "yes", "no", "y", "n"];

/// Spellings that count as true during coercion.
const TRUTHY_SPELLINGS: [&str; 4] = ["true", "1", "yes", "y"];

/// Placeholder tokens that are never acceptable in a required cell.
const NULL_TOKENS: [&str; 3] = ["null", "undefined", "NaN"];

/// Outcome of the required-value gate.
enum Gate {
    /// Cell failed the gate; no further checks run.
    Stop(ValidationError),
    /// Empty optional cell; valid as-is, no type checks.
    SkipValid,
    /// Continue with type-specific checks.
    Continue,
}

/// Validate one cell against its column rules.
///
/// Returns every finding for the cell. An empty vec means the cell is
/// valid and safe to coerce.
pub(crate) fn validate_cell(
    column: &ColumnSchema,
    value: &str,
    row: usize,
    line: usize,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match required_gate(column, value, row, line) {
        Gate::Stop(err) => {
            errors.push(err);
            return errors;
        }
        Gate::SkipValid => return errors,
        Gate::Continue => {}
    }

    match column.data_type {
        DataType::String | DataType::Email => check_string(column, value, row, line, &mut errors),
        DataType::Number => check_number(column, value, row, line, &mut errors),
        DataType::Date => check_date(column, value, row, line, &mut errors),
        DataType::Boolean => check_boolean(column, value, row, line, &mut errors),
    }

    errors
}

fn cell_error(
    code: ErrorCode,
    column: &ColumnSchema,
    value: &str,
    row: usize,
    line: usize,
    message: String,
) -> ValidationError {
    ValidationError::new(code, line, message)
        .with_row(row)
        .with_column(column.name.clone())
        .with_value(value)
}

// =============================================================================
// Required Gate
// =============================================================================

fn required_gate(column: &ColumnSchema, value: &str, row: usize, line: usize) -> Gate {
    if value.is_empty() {
        if column.required {
            return Gate::Stop(cell_error(
                ErrorCode::MissingRequiredValue,
                column,
                value,
                row,
                line,
                format!("Required value for column '{}' is missing", column.display_name),
            ));
        }
        return Gate::SkipValid;
    }

    if column.required && NULL_TOKENS.contains(&value) {
        return Gate::Stop(cell_error(
            ErrorCode::InvalidRequiredValue,
            column,
            value,
            row,
            line,
            format!(
                "Value '{}' is not allowed for required column '{}'",
                value, column.display_name
            ),
        ));
    }

    Gate::Continue
}

// =============================================================================
// Strings
// =============================================================================

fn check_string(
    column: &ColumnSchema,
    value: &str,
    row: usize,
    line: usize,
    errors: &mut Vec<ValidationError>,
) {
    let length = value.chars().count();

    if let Some(min) = column.min_length {
        if length < min {
            errors.push(cell_error(
                ErrorCode::ValueTooShort,
                column,
                value,
                row,
                line,
                format!(
                    "Value '{}' has {} character(s), minimum length is {}",
                    value, length, min
                ),
            ));
        }
    }

    if let Some(max) = column.max_length {
        if length > max {
            errors.push(cell_error(
                ErrorCode::ValueTooLong,
                column,
                value,
                row,
                line,
                format!(
                    "Value '{}' has {} character(s), maximum length is {}",
                    value, length, max
                ),
            ));
        }
    }

    if let Some(ref pattern) = column.pattern {
        match Regex::new(pattern) {
            Ok(regex) => {
                if !regex.is_match(value) {
                    errors.push(
                        cell_error(
                            ErrorCode::PatternMismatch,
                            column,
                            value,
                            row,
                            line,
                            format!("Value '{}' does not match the expected pattern", value),
                        )
                        .with_expected_format(pattern.clone()),
                    );
                }
            }
            Err(_) => {
                errors.push(cell_error(
                    ErrorCode::InvalidPattern,
                    column,
                    value,
                    row,
                    line,
                    format!(
                        "Pattern '{}' for column '{}' is not a valid regular expression",
                        pattern, column.display_name
                    ),
                ));
            }
        }
    }
}

// =============================================================================
// Numbers
// =============================================================================

fn check_number(
    column: &ColumnSchema,
    value: &str,
    row: usize,
    line: usize,
    errors: &mut Vec<ValidationError>,
) {
    let number = match value.parse::<f64>() {
        // NaN and infinities have no JSON representation
        Ok(n) if n.is_finite() => n,
        _ => {
            errors.push(
                cell_error(
                    ErrorCode::InvalidNumber,
                    column,
                    value,
                    row,
                    line,
                    format!("Value '{}' is not a valid number", value),
                )
                .with_expected_format("123 or 123.45"),
            );
            return;
        }
    };

    if let Some(min) = column.min_value {
        if number < min {
            errors.push(cell_error(
                ErrorCode::ValueTooSmall,
                column,
                value,
                row,
                line,
                format!("Value {} is below the minimum of {}", number, min),
            ));
        }
    }

    if let Some(max) = column.max_value {
        if number > max {
            errors.push(cell_error(
                ErrorCode::ValueTooLarge,
                column,
                value,
                row,
                line,
                format!("Value {} exceeds the maximum of {}", number, max),
            ));
        }
    }
}

// =============================================================================
// Dates
// =============================================================================

fn check_date(
    column: &ColumnSchema,
    value: &str,
    row: usize,
    line: usize,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(ref template) = column.pattern {
        match dates::compile_template(template) {
            Ok(compiled) => {
                if !compiled.matches(value) {
                    errors.push(
                        cell_error(
                            ErrorCode::DateFormatMismatch,
                            column,
                            value,
                            row,
                            line,
                            format!(
                                "Value '{}' does not match the expected date format",
                                value
                            ),
                        )
                        .with_expected_format(dates::template_hint(template)),
                    );
                    return;
                }
            }
            Err(_) => {
                errors.push(cell_error(
                    ErrorCode::InvalidDatePattern,
                    column,
                    value,
                    row,
                    line,
                    format!(
                        "Date pattern '{}' for column '{}' could not be compiled",
                        template, column.display_name
                    ),
                ));
                return;
            }
        }
    }

    // the general shape check runs even when a template already passed
    if dates::parse_generic_date(value).is_none() {
        errors.push(
            cell_error(
                ErrorCode::InvalidDate,
                column,
                value,
                row,
                line,
                format!("Value '{}' is not a valid calendar date", value),
            )
            .with_expected_format(GENERIC_SHAPES_HINT),
        );
    }
}

// =============================================================================
// Booleans
// =============================================================================

fn check_boolean(
    column: &ColumnSchema,
    value: &str,
    row: usize,
    line: usize,
    errors: &mut Vec<ValidationError>,
) {
    let lowered = value.to_lowercase();
    if !BOOLEAN_SPELLINGS.contains(&lowered.as_str()) {
        errors.push(
            cell_error(
                ErrorCode::InvalidBoolean,
                column,
                value,
                row,
                line,
                format!("Value '{}' is not a valid boolean", value),
            )
            .with_expected_format("true, false, 1, 0, yes, no, y, n"),
        );
    }
}

// =============================================================================
// Coercion
// =============================================================================

/// Coerce a validated cell to its JSON representation.
///
/// - empty (after trim) becomes `null`
/// - numbers become JSON numbers
/// - booleans map the truthy spellings to `true`, everything else to `false`
/// - dates are normalized to ISO `YYYY-MM-DD` strings
/// - strings and emails stay strings, trimmed
pub(crate) fn coerce_value(data_type: DataType, value: &str) -> Value {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    match data_type {
        DataType::Number => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        DataType::Boolean => Value::Bool(TRUTHY_SPELLINGS.contains(&trimmed.to_lowercase().as_str())),
        DataType::Date => match dates::parse_generic_date(trimmed) {
            Some(date) => Value::String(date.to_string()),
            None => Value::String(trimmed.to_string()),
        },
        DataType::String | DataType::Email => Value::String(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn string_column() -> ColumnSchema {
        ColumnSchema::new("name", "Full name", DataType::String, 0)
    }

    #[test]
    fn test_required_empty_cell() {
        let column = string_column().required();
        let errors = validate_cell(&column, "", 1, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::MissingRequiredValue);
        assert_eq!(errors[0].row, Some(1));
        assert_eq!(errors[0].line, 2);
        assert!(errors[0].message.contains("Full name"));
    }

    #[test]
    fn test_optional_empty_cell_is_valid() {
        let errors = validate_cell(&string_column(), "", 1, 2);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_required_null_tokens() {
        let column = string_column().required();
        for token in ["null", "undefined", "NaN"] {
            let errors = validate_cell(&column, token, 1, 2);
            assert_eq!(errors.len(), 1, "token {}", token);
            assert_eq!(errors[0].code, ErrorCode::InvalidRequiredValue);
        }
        // case-sensitive: "NULL" is just a string
        assert!(validate_cell(&column, "NULL", 1, 2).is_empty());
        // and on an optional column the tokens pass
        assert!(validate_cell(&string_column(), "null", 1, 2).is_empty());
    }

    #[test]
    fn test_string_length_bounds() {
        let column = string_column().with_length(Some(3), Some(5));

        assert!(validate_cell(&column, "abc", 1, 2).is_empty());
        assert!(validate_cell(&column, "abcde", 1, 2).is_empty());

        let errors = validate_cell(&column, "ab", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::ValueTooShort);
        assert!(errors[0].message.contains("minimum length is 3"));

        let errors = validate_cell(&column, "abcdef", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::ValueTooLong);
    }

    #[test]
    fn test_string_length_counts_characters_not_bytes() {
        let column = string_column().with_length(None, Some(4));
        // four characters, eight bytes
        assert!(validate_cell(&column, "éééé", 1, 2).is_empty());
    }

    #[test]
    fn test_string_pattern() {
        let column = string_column().with_pattern("^[A-Z]{2}-\\d{3}$");

        assert!(validate_cell(&column, "AB-123", 1, 2).is_empty());

        let errors = validate_cell(&column, "ab123", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::PatternMismatch);
        assert_eq!(errors[0].expected_format.as_deref(), Some("^[A-Z]{2}-\\d{3}$"));
    }

    #[test]
    fn test_broken_pattern_reports_invalid_pattern() {
        let column = string_column().with_pattern("([unclosed");
        let errors = validate_cell(&column, "anything", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::InvalidPattern);
        assert!(errors[0].message.contains("([unclosed"));
    }

    #[test]
    fn test_email_validates_as_string() {
        let column = ColumnSchema::new("email", "Email", DataType::Email, 0)
            .with_pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$");

        assert!(validate_cell(&column, "a@b.co", 1, 2).is_empty());
        let errors = validate_cell(&column, "not-an-email", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::PatternMismatch);
    }

    #[test]
    fn test_number_parsing() {
        let column = ColumnSchema::new("age", "Age", DataType::Number, 0);

        assert!(validate_cell(&column, "42", 1, 2).is_empty());
        assert!(validate_cell(&column, "-3.5", 1, 2).is_empty());
        assert!(validate_cell(&column, "1e3", 1, 2).is_empty());

        let errors = validate_cell(&column, "abc", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::InvalidNumber);
        assert_eq!(errors[0].expected_format.as_deref(), Some("123 or 123.45"));

        // whitespace inside is not a number
        assert_eq!(
            validate_cell(&column, "1 000", 1, 2)[0].code,
            ErrorCode::InvalidNumber
        );
    }

    #[test]
    fn test_number_rejects_non_finite() {
        let column = ColumnSchema::new("age", "Age", DataType::Number, 0);
        assert_eq!(validate_cell(&column, "NaN", 1, 2)[0].code, ErrorCode::InvalidNumber);
        assert_eq!(validate_cell(&column, "inf", 1, 2)[0].code, ErrorCode::InvalidNumber);
    }

    #[test]
    fn test_number_range() {
        let column =
            ColumnSchema::new("age", "Age", DataType::Number, 0).with_range(Some(0.0), Some(150.0));

        assert!(validate_cell(&column, "0", 1, 2).is_empty());
        assert!(validate_cell(&column, "150", 1, 2).is_empty());

        let errors = validate_cell(&column, "-1", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::ValueTooSmall);

        let errors = validate_cell(&column, "151", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::ValueTooLarge);
        assert!(errors[0].message.contains("exceeds the maximum of 150"));
    }

    #[test]
    fn test_range_not_checked_when_parse_fails() {
        let column =
            ColumnSchema::new("age", "Age", DataType::Number, 0).with_range(Some(0.0), Some(10.0));
        let errors = validate_cell(&column, "abc", 1, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::InvalidNumber);
    }

    #[test]
    fn test_date_with_template() {
        let column =
            ColumnSchema::new("d", "Date", DataType::Date, 0).with_pattern("YYYY-MM-DD");

        assert!(validate_cell(&column, "2023-01-15", 1, 2).is_empty());

        let errors = validate_cell(&column, "01/15/1993", 1, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::DateFormatMismatch);
        let hint = errors[0].expected_format.as_deref().unwrap();
        assert!(hint.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_day_first_template_match_still_needs_generic_shape() {
        let column = ColumnSchema::new("d", "Date", DataType::Date, 0).with_pattern("DD/MM/YYYY");

        // a day that also reads as a month satisfies the month-first shapes
        assert!(validate_cell(&column, "05/12/2023", 1, 2).is_empty());

        // day 25 fits the template, but no generic shape reads 25 as a month
        let errors = validate_cell(&column, "25/12/2023", 1, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::InvalidDate);
    }

    #[test]
    fn test_date_without_template_accepts_generic_shapes() {
        let column = ColumnSchema::new("d", "Date", DataType::Date, 0);
        assert!(validate_cell(&column, "2023-01-15", 1, 2).is_empty());
        assert!(validate_cell(&column, "01/15/2023", 1, 2).is_empty());

        let errors = validate_cell(&column, "Jan 15, 2023", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::InvalidDate);
    }

    #[test]
    fn test_date_rollover_is_invalid() {
        let column = ColumnSchema::new("d", "Date", DataType::Date, 0);
        let errors = validate_cell(&column, "2023-02-30", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::InvalidDate);
    }

    #[test]
    fn test_broken_date_template() {
        let column = ColumnSchema::new("d", "Date", DataType::Date, 0).with_pattern("yyyy(");
        let errors = validate_cell(&column, "2023-01-15", 1, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::InvalidDatePattern);
    }

    #[test]
    fn test_boolean_spellings() {
        let column = ColumnSchema::new("b", "Flag", DataType::Boolean, 0);
        for ok in ["true", "FALSE", "1", "0", "Yes", "no", "Y", "n"] {
            assert!(validate_cell(&column, ok, 1, 2).is_empty(), "spelling {}", ok);
        }

        let errors = validate_cell(&column, "maybe", 1, 2);
        assert_eq!(errors[0].code, ErrorCode::InvalidBoolean);
        assert!(errors[0].expected_format.as_deref().unwrap().contains("yes"));
    }

    #[test]
    fn test_coerce_values() {
        assert_eq!(coerce_value(DataType::String, "  hi  "), json!("hi"));
        assert_eq!(coerce_value(DataType::String, "   "), json!(null));
        assert_eq!(coerce_value(DataType::Number, "30"), json!(30.0));
        assert_eq!(coerce_value(DataType::Number, "-2.5"), json!(-2.5));
        assert_eq!(coerce_value(DataType::Boolean, "YES"), json!(true));
        assert_eq!(coerce_value(DataType::Boolean, "0"), json!(false));
        assert_eq!(coerce_value(DataType::Boolean, "n"), json!(false));
        assert_eq!(coerce_value(DataType::Email, "a@b.co"), json!("a@b.co"));
    }

    #[test]
    fn test_coerce_date_normalizes_to_iso() {
        assert_eq!(coerce_value(DataType::Date, "01/15/2023"), json!("2023-01-15"));
        assert_eq!(coerce_value(DataType::Date, "2023-01-15"), json!("2023-01-15"));
        assert_eq!(coerce_value(DataType::Date, "1/5/2023"), json!("2023-01-05"));
    }
}
