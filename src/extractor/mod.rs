//! Content Extraction
//!
//! Reads source archives, classifies their entries, renders the structure
//! report shared with the agents, and samples source files for analysis.

mod archive;
mod classify;
mod report;
mod source;
mod summary;

pub use archive::SourceArchive;
pub use classify::{FileCategory, FileClassification};
pub use report::format_report;
pub use source::{
    ExtractedFile, ExtractedSource, ExtractionMetadata, ExtractionOptions, SourceExtractor,
};
pub use summary::CodeSummarizer;

#[cfg(test)]
pub(crate) use archive::test_support;
