//! Upload module.
//!
//! This module handles the full journey of an uploaded file:
//! - Pipeline: decode, validate, persist
//! - Export: render clean rows back to delimited text

pub mod export;
pub mod pipeline;

pub use export::rows_to_csv;
pub use pipeline::{process_upload, UploadOutcome, UploadStatus};
