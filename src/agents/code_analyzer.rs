//! Code-Validated Analyzer
//!
//! Checks the infrastructure verdict of one stage against its source code and
//! writes an improved Markdown analysis.

use tracing::debug;

use crate::ai::{PromptBuilder, SharedProvider};
use crate::types::{Result, Stage};

#[derive(Debug, Clone, Copy)]
pub struct CodeInputs<'a> {
    pub context: &'a str,
    pub prior_analysis: &'a str,
    pub source: &'a str,
    pub structure: &'a str,
}

pub struct CodeAnalyzer {
    provider: SharedProvider,
}

impl CodeAnalyzer {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    pub async fn analyze(&self, inputs: CodeInputs<'_>, stage: Stage) -> Result<String> {
        let version = stage.as_str().to_uppercase();
        let prompt = PromptBuilder::new()
            .role(
                "software architect",
                "hybrid architectures, Infrastructure as Code, and design patterns. You reason rigorously and write for expert architects",
            )
            .text(&format!(
                "You are given four sources of information about a {} solution: a theoretical \
                 introduction to software architecture, a previous analysis derived from its \
                 Terraform description ({} evolution), the source code, and the project structure. \
                 Use all of them.",
                stage.version_type(),
                version
            ))
            .section("THEORETICAL CONTEXT", inputs.context)
            .section(
                &format!("PREVIOUS TERRAFORM-BASED ANALYSIS ({})", version),
                inputs.prior_analysis,
            )
            .section("PROJECT STRUCTURE", inputs.structure)
            .section("SOURCE CODE", inputs.source)
            .tasks(&[
                "Analyze the project structure: how the codebase is organized (monolithic or modular), separation of concerns, service boundaries and dependency management.".to_string(),
                "Validate or correct the previous analysis using evidence from the source code and the project structure.".to_string(),
                "Identify additional patterns: communication between components, data access (for example a data store per service), deployment configuration in code, and design patterns (Strategy, Factory, CQRS).".to_string(),
                format!(
                    "Write an improved architecture analysis that describes the current architecture from code evidence, explains how and why it is {}, highlights quality attributes (scalability, maintainability, performance, security), discusses its potential evolution, and cites the files and patterns that support it.",
                    stage.version_description()
                ),
            ])
            .rules(
                "OUTPUT",
                &["Well-structured Markdown with clear headings, without a surrounding code fence"],
            )
            .build(format!("code_analysis:{}", stage));

        debug!(stage = %stage, chars = prompt.char_count(), "Code analysis prompt");
        self.provider.invoke(&prompt).await
    }
}
