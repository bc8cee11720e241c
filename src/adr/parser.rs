//! Heading scanner for Markdown decision records.
//!
//! Records start at lines beginning with `# ADR` (case-insensitive); the name
//! follows the first `:`. Sections start at `## ` lines and run to the next
//! marker. List sections keep only `-`/`*` items.

use super::record::{AdrStatus, DecisionRecord};

/// Parse every record in `markdown`. Text before the first record is ignored.
pub fn parse_records(markdown: &str) -> Vec<DecisionRecord> {
    let mut records = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in markdown.lines() {
        if is_record_start(line) {
            if let Some(block) = current.take() {
                records.push(parse_block(&block));
            }
            current = Some(vec![line]);
        } else if let Some(block) = current.as_mut() {
            block.push(line);
        }
    }
    if let Some(block) = current {
        records.push(parse_block(&block));
    }
    records
}

fn is_record_start(line: &str) -> bool {
    line.trim().to_lowercase().starts_with("# adr")
}

fn parse_block(lines: &[&str]) -> DecisionRecord {
    let mut record = DecisionRecord {
        adr_name: lines
            .first()
            .and_then(|l| l.split_once(':'))
            .map(|(_, name)| name.trim().to_string())
            .unwrap_or_default(),
        ..DecisionRecord::default()
    };

    let mut heading: Option<&str> = None;
    let mut body: Vec<&str> = Vec::new();
    for line in lines.iter().skip(1) {
        if let Some(next) = line.strip_prefix("## ") {
            if let Some(h) = heading {
                assign(&mut record, h, &body);
            }
            heading = Some(next.trim());
            body.clear();
        } else {
            body.push(line);
        }
    }
    if let Some(h) = heading {
        assign(&mut record, h, &body);
    }
    record
}

fn assign(record: &mut DecisionRecord, heading: &str, body: &[&str]) {
    let text = || body.join("\n").trim().to_string();
    match heading.to_lowercase().as_str() {
        "title" => record.title = text(),
        "status" => record.status = AdrStatus::parse(&text()).unwrap_or_default(),
        "motivation" => record.motivation = text(),
        "decision drivers" => record.decision_drivers = list_items(body),
        "main decision" => record.main_decision = text(),
        "alternatives" => record.alternatives = list_items(body),
        "pros" => record.pros = text(),
        "cons" => record.cons = text(),
        "consequences" => record.consequences = text(),
        "validation" => record.validation = text(),
        "additional information" => record.additional_information = text(),
        _ => {}
    }
}

fn list_items(body: &[&str]) -> Vec<String> {
    body.iter()
        .filter_map(|line| {
            line.strip_prefix('-')
                .or_else(|| line.strip_prefix('*'))
                .map(|item| item.trim().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adr::record::sample_record;

    #[test]
    fn test_rendered_record_parses_back() {
        let original = sample_record();
        let parsed = parse_records(&original.to_markdown());

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], original);
    }

    #[test]
    fn test_multiple_records_and_preamble() {
        let md = "Here you go.\n\n# ADR: First\n## Title\nOne\n## Status\nrejected\n\n\
                  # adr: Second\n## Title\nTwo\n## Status\nsomething else\n";
        let records = parse_records(md);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].adr_name, "First");
        assert_eq!(records[0].status, AdrStatus::Rejected);
        assert_eq!(records[1].title, "Two");
        assert_eq!(records[1].status, AdrStatus::Proposed);
    }

    #[test]
    fn test_list_sections_keep_only_items() {
        let md = "# ADR: X\n## Decision Drivers\nIntro line\n- a\n* b \n  not an item\n## Main Decision\nGo";
        let record = &parse_records(md)[0];
        assert_eq!(record.decision_drivers, vec!["a", "b"]);
        assert_eq!(record.main_decision, "Go");
    }

    #[test]
    fn test_no_records() {
        assert!(parse_records("## Title\nOrphan").is_empty());
    }
}
