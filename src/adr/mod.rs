//! Architecture Decision Records
//!
//! The record model, its fixed Markdown layout, a heading-scanner parser for
//! Markdown records, and the consolidated JSON export.

mod export;
mod parser;
mod record;

pub use export::{export_path, records_to_json, write_outputs};
pub use parser::parse_records;
pub use record::{AdrStatus, DecisionRecord, SECTION_HEADINGS};

#[cfg(test)]
pub(crate) use record::sample_record;
