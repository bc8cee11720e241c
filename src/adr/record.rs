use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{AdrError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdrStatus {
    #[default]
    Proposed,
    Accepted,
    Rejected,
    Deprecated,
    Superseded,
}

impl AdrStatus {
    pub const ALL: [AdrStatus; 5] = [
        Self::Proposed,
        Self::Accepted,
        Self::Rejected,
        Self::Deprecated,
        Self::Superseded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "Proposed",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Deprecated => "Deprecated",
            Self::Superseded => "Superseded",
        }
    }

    /// Case-insensitive match against the five status names.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for AdrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdrStatus {
    type Err = AdrError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            AdrError::Configuration(format!(
                "Unknown ADR status '{}'. Valid values: Proposed, Accepted, Rejected, Deprecated, Superseded",
                s
            ))
        })
    }
}

/// One architecture decision, in the fixed section layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub adr_name: String,
    pub title: String,
    pub status: AdrStatus,
    pub motivation: String,
    pub decision_drivers: Vec<String>,
    pub main_decision: String,
    pub alternatives: Vec<String>,
    pub pros: String,
    pub cons: String,
    pub consequences: String,
    pub validation: String,
    pub additional_information: String,
}

/// Section headings in render order.
pub const SECTION_HEADINGS: [&str; 11] = [
    "Title",
    "Status",
    "Motivation",
    "Decision Drivers",
    "Main Decision",
    "Alternatives",
    "Pros",
    "Cons",
    "Consequences",
    "Validation",
    "Additional Information",
];

impl DecisionRecord {
    /// Output file name of the `index`-th record (1-based).
    pub fn file_name(project: &str, index: usize) -> String {
        format!("{}_ADR_{}.md", project, index)
    }

    /// Render the fixed layout. Headings inside section bodies are demoted to
    /// at least `###`, so the document always has exactly the section headings.
    pub fn to_markdown(&self) -> String {
        let name = self.adr_name.lines().map(str::trim).collect::<Vec<_>>().join(" ");
        let mut lines = vec![format!("# ADR: {}", name)];
        for heading in SECTION_HEADINGS {
            lines.push(String::new());
            lines.push(format!("## {}", heading));
            let body = match heading {
                "Decision Drivers" => bullets(&self.decision_drivers),
                "Alternatives" => bullets(&self.alternatives),
                _ => self.text_section(heading).to_string(),
            };
            lines.extend(body.lines().map(demote_heading));
            if body.is_empty() {
                lines.push(String::new());
            }
        }
        lines.join("\n")
    }

    fn text_section(&self, heading: &str) -> &str {
        match heading {
            "Title" => &self.title,
            "Status" => self.status.as_str(),
            "Motivation" => &self.motivation,
            "Main Decision" => &self.main_decision,
            "Pros" => &self.pros,
            "Cons" => &self.cons,
            "Consequences" => &self.consequences,
            "Validation" => &self.validation,
            "Additional Information" => &self.additional_information,
            _ => "",
        }
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `## Option` -> `### Option`; deeper headings and other lines are kept.
fn demote_heading(line: &str) -> String {
    let rest = line.trim_start();
    let level = rest.chars().take_while(|c| *c == '#').count();
    if level == 0 || level >= 3 {
        return line.to_string();
    }
    let indent = &line[..line.len() - rest.len()];
    format!("{}###{}", indent, &rest[level..])
}

#[cfg(test)]
pub(crate) fn sample_record() -> DecisionRecord {
    DecisionRecord {
        adr_name: "Strangler migration".into(),
        title: "Extract billing behind a router".into(),
        status: AdrStatus::Accepted,
        motivation: "The monolith couples release cycles.".into(),
        decision_drivers: vec!["Independent deployment".into(), "Team autonomy".into()],
        main_decision: "Route billing traffic to a new service.".into(),
        alternatives: vec!["Big-bang rewrite".into()],
        pros: "- Main decision:\n  - Incremental".into(),
        cons: "- Main decision:\n  - Dual running cost".into(),
        consequences: "More moving parts.".into(),
        validation: "Canary releases.".into(),
        additional_information: String::new(),
    }
}
