//! Consolidated JSON export of a run's records.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use super::record::DecisionRecord;
use crate::types::Result;

#[derive(Serialize)]
struct ExportedRecord<'a> {
    #[serde(flatten)]
    record: &'a DecisionRecord,
    source_file: String,
}

/// Pretty JSON array of `(file_name, record)` pairs; each object gains
/// `source_file = {output_dir_name}/{file_name}`.
pub fn records_to_json<'a, I>(records: I, output_dir_name: &str) -> Result<String>
where
    I: IntoIterator<Item = (&'a str, &'a DecisionRecord)>,
{
    let exported: Vec<ExportedRecord<'_>> = records
        .into_iter()
        .map(|(file_name, record)| ExportedRecord {
            record,
            source_file: format!("{}/{}", output_dir_name, file_name),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&exported)?)
}

/// Path of the JSON export for `project` inside `output_dir`.
pub fn export_path(output_dir: &Path, project: &str) -> PathBuf {
    output_dir.join(format!("{}_ADRs.json", project))
}

/// Write the rendered documents of a run, plus the JSON export when asked.
/// Returns the written paths.
pub fn write_outputs(
    output_dir: &Path,
    project: &str,
    files: &BTreeMap<String, String>,
    records: &[DecisionRecord],
    with_json: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(files.len() + 1);
    for (name, document) in files {
        let path = output_dir.join(name);
        std::fs::write(&path, document)?;
        written.push(path);
    }

    if with_json {
        let dir_name = output_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(crate::constants::paths::DEFAULT_OUTPUT_DIR);
        let names: Vec<String> = (1..=records.len())
            .map(|i| DecisionRecord::file_name(project, i))
            .collect();
        let json = records_to_json(
            names.iter().map(String::as_str).zip(records.iter()),
            dir_name,
        )?;
        let path = export_path(output_dir, project);
        std::fs::write(&path, json)?;
        written.push(path);
    }

    info!(
        "Wrote {} file(s) to {}",
        written.len(),
        output_dir.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adr::record::sample_record;

    #[test]
    fn test_export_carries_source_file() {
        let record = sample_record();
        let json = records_to_json([("shop_ADR_1.md", &record)], "output-adrs").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["source_file"], "output-adrs/shop_ADR_1.md");
        assert_eq!(value[0]["status"], "Accepted");
        assert_eq!(value[0]["decision_drivers"][1], "Team autonomy");
    }

    #[test]
    fn test_write_outputs() {
        let temp = tempfile::TempDir::new().unwrap();
        let out = temp.path().join("records");
        let record = sample_record();
        let files = BTreeMap::from([("shop_ADR_1.md".to_string(), record.to_markdown())]);

        let written = write_outputs(&out, "shop", &files, &[record], true).unwrap();
        assert_eq!(written.len(), 2);

        let md = std::fs::read_to_string(out.join("shop_ADR_1.md")).unwrap();
        assert!(md.starts_with("# ADR: Strangler migration"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("shop_ADRs.json")).unwrap())
                .unwrap();
        assert_eq!(json[0]["source_file"], "records/shop_ADR_1.md");
    }

    #[test]
    fn test_export_path() {
        assert_eq!(
            export_path(Path::new("/out"), "shop"),
            PathBuf::from("/out/shop_ADRs.json")
        );
    }
}
