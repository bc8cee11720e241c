//! File classification for archive entries.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::constants::extraction::CONFIG_FILE_NAMES;

/// Category of a non-directory archive entry. Declaration order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Python,
    TypeScript,
    Tsx,
    JavaScript,
    Php,
    Java,
    Xml,
    Terraform,
    Config,
    Other,
}

impl FileCategory {
    pub const ALL: [FileCategory; 10] = [
        Self::Python,
        Self::TypeScript,
        Self::Tsx,
        Self::JavaScript,
        Self::Php,
        Self::Java,
        Self::Xml,
        Self::Terraform,
        Self::Config,
        Self::Other,
    ];

    /// Extension rules win over configuration names, so `pom.xml` is XML.
    pub fn from_path(path: &str) -> Self {
        let path = Path::new(path);
        let by_extension = match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Some(Self::Python),
            Some("ts") => Some(Self::TypeScript),
            Some("tsx") => Some(Self::Tsx),
            Some("js") => Some(Self::JavaScript),
            Some("php") => Some(Self::Php),
            Some("java") => Some(Self::Java),
            Some("xml") => Some(Self::Xml),
            Some("tf") => Some(Self::Terraform),
            _ => None,
        };
        by_extension.unwrap_or_else(|| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if CONFIG_FILE_NAMES.contains(&name) {
                Self::Config
            } else {
                Self::Other
            }
        })
    }

    /// Label of the count line in the structure report.
    pub fn count_label(&self) -> &'static str {
        match self {
            Self::Python => "Python Files",
            Self::TypeScript => "TypeScript Files",
            Self::Tsx => "TSX Files",
            Self::JavaScript => "JavaScript Files",
            Self::Php => "PHP Files",
            Self::Java => "Java Files",
            Self::Xml => "XML Files",
            Self::Terraform => "Terraform Files",
            Self::Config => "Configuration Files",
            Self::Other => "Other Files",
        }
    }

    /// Heading used in the breakdown section of the structure report.
    pub fn breakdown_heading(&self) -> &'static str {
        match self {
            Self::Python => "Python Source Files",
            Self::TypeScript => "TypeScript Source Files",
            Self::Tsx => "TSX (React) Files",
            Self::JavaScript => "JavaScript Source Files",
            Self::Php => "PHP Source Files",
            Self::Java => "Java Source Files",
            Self::Xml => "XML Files",
            Self::Terraform => "Terraform Files",
            Self::Config => "Configuration Files",
            Self::Other => "Other Files",
        }
    }

    /// Language name used in summarization prompts.
    pub fn language_name(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::TypeScript => "TypeScript",
            Self::Tsx => "TypeScript React (TSX)",
            Self::JavaScript => "JavaScript",
            Self::Php => "PHP",
            Self::Java => "Java",
            Self::Xml => "XML",
            Self::Terraform => "Terraform",
            Self::Config | Self::Other => "code",
        }
    }
}

/// Archive entries grouped by category, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileClassification {
    /// Directory entries with the trailing `/` removed
    pub directories: Vec<String>,
    files: BTreeMap<FileCategory, Vec<String>>,
}

impl FileClassification {
    /// Classify `(name, is_dir)` pairs as listed by the archive.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let mut classification = Self::default();
        for (name, is_dir) in entries {
            let name = name.as_ref();
            if is_dir {
                classification
                    .directories
                    .push(name.trim_end_matches('/').to_string());
            } else {
                classification
                    .files
                    .entry(FileCategory::from_path(name))
                    .or_default()
                    .push(name.to_string());
            }
        }
        classification
    }

    pub fn files(&self, category: FileCategory) -> &[String] {
        self.files.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_files(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Every file path, category by category.
    pub fn all_files(&self) -> impl Iterator<Item = &str> {
        self.files.values().flatten().map(String::as_str)
    }
}
