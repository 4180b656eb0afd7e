//! Render processed rows back to delimited text.
//!
//! Accepted uploads are persisted as a clean CSV of their coerced rows:
//! schema column order, coerced values, proper quoting. The `csv` crate
//! handles quoting and escaping on the way out.

use serde_json::Value;

use crate::error::{UploadError, UploadResult};
use crate::schema::ColumnSchema;
use crate::validator::ProcessedRow;

/// Write `rows` as delimited text with one column per schema column.
///
/// Cells the row has no value for (and explicit nulls) render empty.
/// Rows flagged with errors are skipped; the export is the clean subset.
pub fn rows_to_csv(
    columns: &[ColumnSchema],
    rows: &[ProcessedRow],
    delimiter: char,
) -> UploadResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .from_writer(Vec::new());

    let header: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    writer
        .write_record(&header)
        .map_err(|e| UploadError::Export(e.to_string()))?;

    for row in rows.iter().filter(|r| !r.has_errors) {
        let record: Vec<String> = columns
            .iter()
            .map(|column| render_cell(row.values.get(&column.name)))
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| UploadError::Export(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| UploadError::Export(e.to_string()))
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => render_number(n),
        Some(other) => other.to_string(),
    }
}

/// Integral floats print without the trailing `.0`.
fn render_number(number: &serde_json::Number) -> String {
    if let Some(f) = number.as_f64() {
        if f.fract() == 0.0 && f.abs() < 1e15 {
            return format!("{}", f as i64);
        }
    }
    number.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, ValidationConfig};
    use crate::validator::Validator;

    fn export_for(content: &str) -> String {
        let config = ValidationConfig {
            allow_partial_upload: true,
            ..ValidationConfig::default()
        };
        let columns = vec![
            ColumnSchema::new("name", "Name", DataType::String, 0).required(),
            ColumnSchema::new("age", "Age", DataType::Number, 1),
            ColumnSchema::new("active", "Active", DataType::Boolean, 2),
        ];
        let validator = Validator::new(config, columns).unwrap();
        let result = validator.validate_content(content);
        let bytes = rows_to_csv(validator.columns(), &result.processed_rows, ',').unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_export_renders_coerced_values() {
        let csv = export_for("name,age,active\nAlice,30,yes\nBob,2.5,no\n");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,age,active"));
        assert_eq!(lines.next(), Some("Alice,30,true"));
        assert_eq!(lines.next(), Some("Bob,2.5,false"));
    }

    #[test]
    fn test_export_skips_flagged_rows_and_blanks_nulls() {
        let csv = export_for("name,age,active\nAlice,,\nBob,not-a-number,\n");
        // Bob failed validation, Alice's empty optionals render empty
        assert_eq!(csv, "name,age,active\nAlice,,\n");
    }

    #[test]
    fn test_export_quotes_embedded_delimiters() {
        let csv = export_for("name,age,active\n\"Smith, Alice\",30,\n");
        assert!(csv.contains("\"Smith, Alice\""));
    }

    #[test]
    fn test_export_empty_rowset_is_header_only() {
        let columns = vec![ColumnSchema::new("a", "A", DataType::String, 0)];
        let bytes = rows_to_csv(&columns, &[], ';').unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a\n");
    }
}
