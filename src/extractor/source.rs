//! Bounded source sampling with optional summarization of large files.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::archive::SourceArchive;
use super::summary::CodeSummarizer;
use crate::config::ContextGenerationConfig;
use crate::constants::extraction::{MISSING_SOURCE_NOTE, SUMMARY_CONCURRENCY};
use crate::types::{Result, Stage, char_len, truncate_chars};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionOptions {
    pub max_files: usize,
    /// Characters above which a file is summarized or flagged
    pub max_file_size: usize,
    pub summarize: bool,
}

impl From<&ContextGenerationConfig> for ExtractionOptions {
    fn from(config: &ContextGenerationConfig) -> Self {
        Self {
            max_files: config.max_files,
            max_file_size: config.max_file_size,
            summarize: config.summarize_large_files,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub path: String,
    pub content: String,
    pub summarized: bool,
    pub original_chars: usize,
    /// Larger than the limit and kept verbatim
    pub oversized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub total_files: usize,
    pub summarized_files: usize,
    pub full_files: usize,
    pub oversized_files: usize,
    pub branch: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExtractionMetadata {
    /// Metadata recorded for a stage whose archive is absent.
    pub fn missing(stage: Stage) -> Self {
        Self {
            total_files: 0,
            summarized_files: 0,
            full_files: 0,
            oversized_files: 0,
            branch: stage,
            note: Some(MISSING_SOURCE_NOTE.to_string()),
        }
    }
}

/// Extracted files in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSource {
    pub files: Vec<ExtractedFile>,
}

impl ExtractedSource {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|f| (f.path.clone(), f.content.clone()))
            .collect()
    }

    /// `=== path ===` blocks separated by blank lines.
    pub fn concatenated(&self) -> String {
        self.files
            .iter()
            .map(|f| format!("=== {} ===\n{}", f.path, f.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn metadata(&self, stage: Stage) -> ExtractionMetadata {
        let summarized_files = self.files.iter().filter(|f| f.summarized).count();
        ExtractionMetadata {
            total_files: self.files.len(),
            summarized_files,
            full_files: self.files.len() - summarized_files,
            oversized_files: self.files.iter().filter(|f| f.oversized).count(),
            branch: stage,
            note: None,
        }
    }
}

pub struct SourceExtractor {
    options: ExtractionOptions,
    summarizer: Option<CodeSummarizer>,
}

impl SourceExtractor {
    pub fn new(options: ExtractionOptions) -> Self {
        Self {
            options,
            summarizer: None,
        }
    }

    pub fn with_summarizer(mut self, summarizer: CodeSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Sample the first `max_files` candidates of `archive`. Files that cannot
    /// be read or summarized are logged and left out.
    pub async fn extract(&self, archive: &mut SourceArchive) -> Result<ExtractedSource> {
        let mut raw = Vec::new();
        for path in archive.code_candidates(self.options.max_files) {
            match archive.read_lossy(&path) {
                Ok(content) => raw.push((path, content)),
                Err(e) => warn!("Skipping unreadable file {}: {}", path, e),
            }
        }

        let files: Vec<ExtractedFile> = stream::iter(raw)
            .map(|(path, content)| self.process(path, content))
            .buffered(SUMMARY_CONCURRENCY)
            .filter_map(|file| async move { file })
            .collect()
            .await;

        debug!(
            archive = %archive.path().display(),
            files = files.len(),
            "Extracted source sample"
        );
        Ok(ExtractedSource { files })
    }

    async fn process(&self, path: String, content: String) -> Option<ExtractedFile> {
        let limit = self.options.max_file_size;
        let original_chars = char_len(&content);

        if original_chars <= limit {
            return Some(ExtractedFile {
                path,
                content,
                summarized: false,
                original_chars,
                oversized: false,
            });
        }

        let summarizer = match (&self.summarizer, self.options.summarize) {
            (Some(s), true) => s,
            _ => {
                return Some(ExtractedFile {
                    path,
                    content,
                    summarized: false,
                    original_chars,
                    oversized: true,
                });
            }
        };

        match summarizer.summarize(&path, &content, limit).await {
            Ok(summary) => {
                let body = truncate_chars(summary.trim(), limit);
                let content = format!(
                    "[SUMMARIZED - Original size: {} chars, Summary size: {} chars] {}",
                    original_chars,
                    char_len(body),
                    body
                );
                Some(ExtractedFile {
                    path,
                    content,
                    summarized: true,
                    original_chars,
                    oversized: false,
                })
            }
            Err(e) => {
                warn!("Skipping {}: summarization failed: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::extractor::test_support::write_zip;
    use crate::types::ErrorCategory;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn options(max_files: usize, max_file_size: usize, summarize: bool) -> ExtractionOptions {
        ExtractionOptions {
            max_files,
            max_file_size,
            summarize,
        }
    }

    fn archive_with(temp: &TempDir, entries: &[(&str, &[u8])]) -> SourceArchive {
        let path = temp.path().join("app.zip");
        write_zip(&path, entries);
        SourceArchive::open(&path).unwrap()
    }

    #[tokio::test]
    async fn test_sample_is_sorted_and_capped() {
        let temp = TempDir::new().unwrap();
        let mut archive = archive_with(
            &temp,
            &[
                ("c.py", b"c"),
                ("a.py", b"a"),
                ("notes.md", b"skip"),
                ("b.js", b"b"),
            ],
        );

        let source = SourceExtractor::new(options(2, 100, false))
            .extract(&mut archive)
            .await
            .unwrap();

        let map = source.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), ["a.py", "b.js"]);
        assert_eq!(source.concatenated(), "=== a.py ===\na\n\n=== b.js ===\nb");
    }

    #[tokio::test]
    async fn test_oversized_without_summarization_is_flagged() {
        let temp = TempDir::new().unwrap();
        let big = "x".repeat(50);
        let mut archive = archive_with(&temp, &[("big.py", big.as_bytes()), ("ok.py", b"ok")]);

        let source = SourceExtractor::new(options(10, 10, false))
            .extract(&mut archive)
            .await
            .unwrap();

        let big_file = &source.files[0];
        assert!(big_file.oversized);
        assert_eq!(big_file.content, big);

        let meta = source.metadata(Stage::Minor);
        assert_eq!(meta.total_files, 2);
        assert_eq!(meta.oversized_files, 1);
        assert_eq!(meta.full_files, 2);
        assert_eq!(meta.summarized_files, 0);
    }

    #[tokio::test]
    async fn test_summaries_are_capped_and_prefixed() {
        let temp = TempDir::new().unwrap();
        let big = "y".repeat(40);
        let mut archive = archive_with(&temp, &[("svc/main.py", big.as_bytes())]);

        let provider = Arc::new(
            ScriptedProvider::new().with_text("summary", "a summary that is far too long"),
        );
        let source = SourceExtractor::new(options(10, 12, true))
            .with_summarizer(CodeSummarizer::new(provider))
            .extract(&mut archive)
            .await
            .unwrap();

        let file = &source.files[0];
        assert!(file.summarized);
        let prefix = "[SUMMARIZED - Original size: 40 chars, Summary size: 12 chars] ";
        assert!(file.content.starts_with(prefix));
        let body = &file.content[prefix.len()..];
        assert_eq!(body, "a summary th");
        assert!(char_len(body) <= 12);
        assert_eq!(source.metadata(Stage::Major).summarized_files, 1);
    }

    #[tokio::test]
    async fn test_failed_summary_skips_file() {
        let temp = TempDir::new().unwrap();
        let big = "z".repeat(40);
        let mut archive = archive_with(&temp, &[("big.ts", big.as_bytes()), ("small.ts", b"s")]);

        let provider = Arc::new(ScriptedProvider::new().failing(
            "summary",
            ErrorCategory::RateLimit,
            "slow down",
        ));
        let source = SourceExtractor::new(options(10, 10, true))
            .with_summarizer(CodeSummarizer::new(provider))
            .extract(&mut archive)
            .await
            .unwrap();

        assert_eq!(source.to_map().keys().collect::<Vec<_>>(), ["small.ts"]);
    }

    #[test]
    fn test_missing_metadata_note() {
        let meta = ExtractionMetadata::missing(Stage::Minor);
        assert_eq!(meta.total_files, 0);
        assert_eq!(meta.note.as_deref(), Some("Source code not available"));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["branch"], "minor");
    }
}
