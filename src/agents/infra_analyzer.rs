//! Infrastructure Analyzer
//!
//! Classifies one Terraform description as microservices or not, with cited
//! evidence for and against and a confidence score.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::conform;
use super::schemas::AgentSchemas;
use crate::ai::{PromptBuilder, SharedProvider};
use crate::types::{LlmError, Result, Stage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub microservices: bool,
    pub confidence: f64,
    pub signals_for: Vec<String>,
    pub signals_against: Vec<String>,
}

impl ClassificationResult {
    /// Markdown rendering used as prior analysis text downstream.
    pub fn to_markdown(&self) -> String {
        let list = |items: &[String]| {
            if items.is_empty() {
                "- (none)".to_string()
            } else {
                items
                    .iter()
                    .map(|s| format!("- {}", s))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        };
        format!(
            "## Infrastructure Classification\n\n\
             **Microservices:** {}\n\
             **Confidence:** {:.2}\n\n\
             ### Signals for microservices\n{}\n\n\
             ### Signals against microservices\n{}",
            if self.microservices { "yes" } else { "no" },
            self.confidence,
            list(&self.signals_for),
            list(&self.signals_against)
        )
    }
}

/// Inputs of one infrastructure analysis.
#[derive(Debug, Clone, Copy)]
pub struct InfraInputs<'a> {
    pub terraform: &'a str,
    pub context: &'a str,
    pub structure: &'a str,
    pub knowledge: &'a str,
}

pub struct InfraAnalyzer {
    provider: SharedProvider,
}

impl InfraAnalyzer {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    pub async fn analyze(&self, inputs: InfraInputs<'_>, stage: Stage) -> Result<ClassificationResult> {
        let prompt = PromptBuilder::new()
            .role(
                "software architect",
                "Infrastructure as Code and cloud-native microservices. You reason rigorously and write for expert architects",
            )
            .section("THEORETICAL CONTEXT", inputs.context)
            .section("IAC RULE CATALOG (prioritize this evidence)", inputs.knowledge)
            .section("PROJECT STRUCTURE", inputs.structure)
            .section("TERRAFORM CODE", inputs.terraform)
            .tasks(&[
                "Decide whether the Terraform code describes a microservices architecture (true/false).",
                "Justify the verdict with explicit evidence, citing [R#] for rules from the IaC catalog and [C#] for fragments of the Terraform code. Cover modularity (modules, reuse), independent deployment of services, communication style (queues, events, APIs) and distributed deployment (networks, subnets, multiple services, orchestrators).",
                "List the signals that point towards a monolith or a tightly coupled design (single deployment unit, one service, shared state).",
                "Give a confidence score between 0 and 1.",
            ])
            .rules(
                "OUTPUT",
                &[
                    "signals_for holds the cited evidence for microservices",
                    "signals_against holds the cited evidence for a monolith",
                    "Every signal cites [R#] and/or [C#]",
                ],
            )
            .build(format!("infra_analysis:{}", stage));

        debug!(stage = %stage, chars = prompt.char_count(), "Infrastructure analysis prompt");
        let value = self
            .provider
            .invoke_structured(&prompt, &AgentSchemas::classification_schema())
            .await?;

        let result: ClassificationResult =
            conform(value, "infrastructure classification", self.provider.name())?;
        if !(0.0..=1.0).contains(&result.confidence) {
            return Err(LlmError::parse(
                format!("confidence {} is outside [0, 1]", result.confidence),
                self.provider.name(),
            )
            .into());
        }

        info!(
            stage = %stage,
            microservices = result.microservices,
            confidence = result.confidence,
            "Infrastructure classified"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::types::{AdrError, ErrorCategory};
    use serde_json::json;
    use std::sync::Arc;

    fn inputs() -> InfraInputs<'static> {
        InfraInputs {
            terraform: "resource \"aws_lambda_function\" \"orders\" {}",
            context: "",
            structure: "PROJECT STRUCTURE ANALYSIS",
            knowledge: "[R1] Independent deployment",
        }
    }

    fn assert_parse_error(result: Result<ClassificationResult>) {
        match result {
            Err(AdrError::Provider(e)) => assert_eq!(e.category, ErrorCategory::ParseError),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_valid_classification() {
        let provider = Arc::new(ScriptedProvider::new().with_json(
            "infra_analysis:major",
            json!({
                "microservices": true,
                "confidence": 0.9,
                "signals_for": ["[C1] three lambda functions", "[R1] separate deploys"],
                "signals_against": []
            }),
        ));
        let analyzer = InfraAnalyzer::new(provider.clone());

        let result = analyzer.analyze(inputs(), Stage::Major).await.unwrap();
        assert!(result.microservices);
        assert_eq!(result.signals_for.len(), 2);

        let prompt = provider.prompt_for("infra_analysis:major").unwrap();
        assert!(prompt.user.contains("## TERRAFORM CODE\nresource"));
        assert!(prompt.user.contains("## THEORETICAL CONTEXT\n(not provided)"));
        assert!(prompt.system.contains("Infrastructure as Code"));
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new().with_json(
            "infra_analysis",
            json!({
                "microservices": false,
                "confidence": 1.4,
                "signals_for": [],
                "signals_against": ["[C1] single service"]
            }),
        ));
        let result = InfraAnalyzer::new(provider).analyze(inputs(), Stage::Minor).await;
        assert_parse_error(result);
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new().with_json(
            "infra_analysis",
            json!({"microservices": "yes", "confidence": 0.5}),
        ));
        let result = InfraAnalyzer::new(provider).analyze(inputs(), Stage::Minor).await;
        assert_parse_error(result);
    }

    #[test]
    fn test_markdown_rendering() {
        let result = ClassificationResult {
            microservices: false,
            confidence: 0.7,
            signals_for: vec![],
            signals_against: vec!["[C2] one ECS service".into()],
        };
        let md = result.to_markdown();
        assert!(md.contains("**Microservices:** no\n**Confidence:** 0.70"));
        assert!(md.contains("### Signals for microservices\n- (none)"));
        assert!(md.ends_with("### Signals against microservices\n- [C2] one ECS service"));
        assert_eq!(md, result.to_markdown());
    }
}
