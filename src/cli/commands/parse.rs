//! Parse Command
//!
//! Recover decision records from a Markdown file by scanning its headings.
//!
//! Usage:
//!   adrsynth parse <FILE> [-f json]

use std::path::Path;

use crate::adr::{DecisionRecord, parse_records};
use crate::cli::Format;
use crate::types::Result;

pub fn run(file: &Path, format: Format) -> Result<()> {
    let markdown = std::fs::read_to_string(file)?;
    let records = parse_records(&markdown);
    print!("{}", render(&records, format)?);
    Ok(())
}

fn render(records: &[DecisionRecord], format: Format) -> Result<String> {
    let out = match format {
        Format::Json => format!("{}\n", serde_json::to_string_pretty(records)?),
        Format::Yaml => serde_yaml::to_string(records)?,
        Format::Text => {
            if records.is_empty() {
                return Ok("No ADR headings found.\n".to_string());
            }
            let mut out = String::new();
            for (i, record) in records.iter().enumerate() {
                out.push_str(&format!(
                    "{}. {} [{}]\n",
                    i + 1,
                    display_name(record),
                    record.status
                ));
                if !record.main_decision.is_empty() {
                    out.push_str(&format!("   {}\n", record.main_decision));
                }
            }
            out
        }
    };
    Ok(out)
}

fn display_name(record: &DecisionRecord) -> &str {
    if record.title.is_empty() {
        &record.adr_name
    } else {
        &record.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adr::{AdrStatus, sample_record};

    #[test]
    fn test_text_lists_titles_and_status() {
        let record = sample_record();
        let text = render(std::slice::from_ref(&record), Format::Text).unwrap();
        assert!(text.starts_with(&format!("1. {} [{}]", record.title, AdrStatus::Accepted)));
    }

    #[test]
    fn test_json_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("shop_ADR_1.md");
        std::fs::write(&path, sample_record().to_markdown()).unwrap();

        let records = parse_records(&std::fs::read_to_string(&path).unwrap());
        let json: serde_json::Value =
            serde_json::from_str(&render(&records, Format::Json).unwrap()).unwrap();
        assert_eq!(json[0]["status"], "Accepted");
        assert!(run(&path, Format::Text).is_ok());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(&[], Format::Text).unwrap(), "No ADR headings found.\n");
    }
}
