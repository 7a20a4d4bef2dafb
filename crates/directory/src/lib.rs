//! Directory extraction and formatting: allow-list matching, the
//! [`ExtractionResult`] handoff object, and the sink payload shapes.

pub mod extract;
pub mod format;
pub mod matcher;
pub mod types;

pub use {
    extract::extract,
    format::{DirectoryRow, Payload, TIMESTAMP_FORMAT, document, rows, section_documents},
    matcher::{matches, normalize},
    types::{DirectorySection, ExtractionResult},
};
