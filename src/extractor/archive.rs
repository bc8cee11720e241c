//! ZIP archive access.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::classify::FileClassification;
use crate::constants::extraction::{CODE_EXTENSIONS, MAX_ENTRY_BYTES, TERRAFORM_EXTENSION};
use crate::types::{AdrError, Result};

pub struct SourceArchive {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl std::fmt::Debug for SourceArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceArchive")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl SourceArchive {
    /// Open and index an archive. Missing or corrupt files are extraction errors.
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let file = File::open(path).map_err(|e| AdrError::extraction(&display, e))?;
        let archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| AdrError::extraction(&display, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names in archive order, paired with whether they are directories.
    pub fn entries(&self) -> Vec<(String, bool)> {
        self.archive
            .file_names()
            .map(|name| (name.to_string(), name.ends_with('/')))
            .collect()
    }

    pub fn classify(&self) -> FileClassification {
        FileClassification::from_entries(self.entries())
    }

    /// Code and Terraform files, sorted by path, capped at `max_files`.
    pub fn code_candidates(&self, max_files: usize) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .archive
            .file_names()
            .filter(|name| {
                name.ends_with(TERRAFORM_EXTENSION)
                    || CODE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
            })
            .map(String::from)
            .collect();
        candidates.sort();
        candidates.truncate(max_files);
        candidates
    }

    /// Read an entry as text; invalid UTF-8 is replaced rather than rejected.
    pub fn read_lossy(&mut self, name: &str) -> Result<String> {
        self.read_limited(name, MAX_ENTRY_BYTES)
    }

    /// Read at most `limit` decompressed bytes of an entry. The size declared
    /// in the archive header is not trusted.
    fn read_limited(&mut self, name: &str, limit: u64) -> Result<String> {
        let entry_label = format!("{}!{}", self.path.display(), name);
        let entry = self
            .archive
            .by_name(name)
            .map_err(|e| AdrError::extraction(&entry_label, e))?;
        let mut bytes = Vec::new();
        entry
            .take(limit)
            .read_to_end(&mut bytes)
            .map_err(|e| AdrError::extraction(&entry_label, e))?;
        if bytes.len() as u64 == limit {
            tracing::warn!("{} truncated at {} bytes", entry_label, limit);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::write_zip;
    use super::*;
    use crate::extractor::FileCategory;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_archive_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let result = SourceArchive::open(&temp.path().join("nope.zip"));
        assert!(matches!(result, Err(AdrError::Extraction { .. })));
    }

    #[test]
    fn test_corrupt_archive_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.zip");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(
            SourceArchive::open(&path),
            Err(AdrError::Extraction { .. })
        ));
    }

    #[test]
    fn test_classify_and_candidates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.zip");
        write_zip(
            &path,
            &[
                ("svc/", b""),
                ("svc/z.py", b"print('z')"),
                ("svc/a.ts", b"export {}"),
                ("infra/main.tf", b"resource {}"),
                ("README.md", b"# readme"),
            ],
        );

        let archive = SourceArchive::open(&path).unwrap();
        let classification = archive.classify();
        assert_eq!(classification.directories, vec!["svc"]);
        assert_eq!(classification.files(FileCategory::Other), ["README.md"]);

        assert_eq!(
            archive.code_candidates(10),
            vec!["infra/main.tf", "svc/a.ts", "svc/z.py"]
        );
        assert_eq!(archive.code_candidates(2), vec!["infra/main.tf", "svc/a.ts"]);
    }

    #[test]
    fn test_read_lossy_replaces_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.zip");
        write_zip(&path, &[("bin.py", &[b'o', b'k', 0xff, b'!'])]);

        let mut archive = SourceArchive::open(&path).unwrap();
        assert_eq!(archive.read_lossy("bin.py").unwrap(), "ok\u{fffd}!");
        assert!(archive.read_lossy("missing.py").is_err());
    }

    #[test]
    fn test_reads_are_bounded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.zip");
        write_zip(&path, &[("big.py", b"0123456789")]);

        let mut archive = SourceArchive::open(&path).unwrap();
        assert_eq!(archive.read_limited("big.py", 4).unwrap(), "0123");
        assert_eq!(archive.read_lossy("big.py").unwrap(), "0123456789");
    }
}
