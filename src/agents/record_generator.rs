//! Record Generator: decision records from the architecture comparison.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::conform;
use super::schemas::AgentSchemas;
use crate::adr::{AdrStatus, DecisionRecord, SECTION_HEADINGS};
use crate::ai::{PromptBuilder, SharedProvider};
use crate::constants::records::{DEFAULT_VALIDATION, MAX_RECORDS};
use crate::types::{LlmError, Result};

/// Record as returned by the model, before status validation.
#[derive(Debug, Deserialize)]
struct RawRecord {
    adr_name: String,
    title: String,
    status: String,
    motivation: String,
    decision_drivers: Vec<String>,
    main_decision: String,
    alternatives: Vec<String>,
    pros: String,
    cons: String,
    consequences: String,
    validation: String,
    additional_information: String,
}

#[derive(Debug, Deserialize)]
struct RawRecordList {
    adrs: Vec<RawRecord>,
}

impl RawRecord {
    fn into_record(self, provider: &str) -> Result<DecisionRecord> {
        let status = AdrStatus::parse(&self.status).ok_or_else(|| {
            LlmError::parse(
                format!("record '{}' has unknown status '{}'", self.adr_name, self.status),
                provider,
            )
        })?;
        let validation = if self.validation.trim().is_empty() {
            DEFAULT_VALIDATION.to_string()
        } else {
            self.validation
        };
        Ok(DecisionRecord {
            adr_name: self.adr_name,
            title: self.title,
            status,
            motivation: self.motivation,
            decision_drivers: self.decision_drivers,
            main_decision: self.main_decision,
            alternatives: self.alternatives,
            pros: self.pros,
            cons: self.cons,
            consequences: self.consequences,
            validation,
            additional_information: self.additional_information,
        })
    }
}

/// Records of one run with their rendered documents keyed by file name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedRecords {
    pub records: Vec<DecisionRecord>,
    pub files: BTreeMap<String, String>,
}

impl GeneratedRecords {
    /// Number records in model order: `{project}_ADR_{i}.md`.
    pub fn from_records(project: &str, records: Vec<DecisionRecord>) -> Self {
        let files = records
            .iter()
            .enumerate()
            .map(|(i, r)| (DecisionRecord::file_name(project, i + 1), r.to_markdown()))
            .collect();
        Self { records, files }
    }

}

pub struct RecordGenerator {
    provider: SharedProvider,
}

impl RecordGenerator {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    pub async fn generate(
        &self,
        comparison: &str,
        context: &str,
        project: &str,
    ) -> Result<GeneratedRecords> {
        let headings = SECTION_HEADINGS.join(", ");
        let prompt = PromptBuilder::new()
            .role(
                "software architect",
                "documenting architecture decisions with MADR-inspired templates. You reason rigorously and write for expert architects",
            )
            .text(
                "You are given a comparison of two architecture analyses of the same application. \
                 Write an Architecture Decision Record for each of the most important decisions \
                 identified in the migration.",
            )
            .section("ARCHITECTURE COMPARISON", comparison)
            .section("THEORETICAL CONTEXT", context)
            .rules(
                "SECTIONS",
                &[
                    format!("Each record has these sections: {}", headings),
                    "title: short and descriptive; avoid technology names not central to the decision".to_string(),
                    "status: one of Proposed, Accepted, Rejected, Deprecated, Superseded, whichever the evidence supports best".to_string(),
                    "motivation: the problem being solved and why a decision is needed now, as continuous prose".to_string(),
                    "decision_drivers: functional requirements, quality attributes and constraints".to_string(),
                    "main_decision: the chosen option, how it addresses the drivers, assumptions, as continuous prose".to_string(),
                    "alternatives: options that were not chosen, never the main decision, each with a one-line description".to_string(),
                    "pros and cons: a ### subheading per option (main decision and each alternative) listing its advantages or disadvantages".to_string(),
                    "consequences: short and long term trade-offs and the impact on scalability, performance, maintainability, security and resilience".to_string(),
                    format!("validation: how the decision can be or has been validated; if unknown write \"{}\"", DEFAULT_VALIDATION),
                    "additional_information: references, related records, issue IDs; empty when there is nothing relevant".to_string(),
                ],
            )
            .rules(
                "RULES",
                &[
                    "Focus on decisions implied by the differences between the hybrid and microservices versions".to_string(),
                    "Do not invent technologies or details the analyses do not support".to_string(),
                    format!("At most {} records", MAX_RECORDS),
                ],
            )
            .build("record_generation");

        debug!(chars = prompt.char_count(), "Record generation prompt");
        let value = self
            .provider
            .invoke_structured(&prompt, &AgentSchemas::records_schema())
            .await?;

        let provider = self.provider.name();
        let mut raw: RawRecordList = conform(value, "decision records", provider)?;
        if raw.adrs.len() > MAX_RECORDS {
            warn!(
                "Model returned {} records; keeping the first {}",
                raw.adrs.len(),
                MAX_RECORDS
            );
            raw.adrs.truncate(MAX_RECORDS);
        }

        let records = raw
            .adrs
            .into_iter()
            .map(|r| r.into_record(provider))
            .collect::<Result<Vec<_>>>()?;

        info!(count = records.len(), "Decision records generated");
        Ok(GeneratedRecords::from_records(project, records))
    }
}

#[cfg(test)]
pub(crate) fn raw_record_json(name: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "adr_name": name,
        "title": format!("{} title", name),
        "status": status,
        "motivation": "Coupled releases",
        "decision_drivers": ["Scalability", "Team autonomy"],
        "main_decision": "Split the service",
        "alternatives": ["Keep the monolith"],
        "pros": "- Main decision:\n  - Independent scaling",
        "cons": "- Main decision:\n  - More infrastructure",
        "consequences": "Higher operational cost",
        "validation": "",
        "additional_information": ""
    })
}
