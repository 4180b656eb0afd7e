//! Validation module.
//!
//! This module turns raw file content into a [`ValidationResult`]:
//! - Engine: header contract and row-by-row orchestration
//! - Cells: per-cell type checks and coercion
//! - Dates: template compilation and calendar checks
//! - Result: error records and the aggregate outcome

mod cells;
mod dates;
mod engine;
mod result;

pub use engine::Validator;
pub use result::{ErrorCode, ProcessedRow, ValidationError, ValidationResult};
