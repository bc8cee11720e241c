//! Comparator: the key decisions behind the move from the hybrid stage to
//! the microservices stage.

use tracing::debug;

use crate::ai::{PromptBuilder, SharedProvider};
use crate::constants::records::MAX_DECISIONS;
use crate::types::Result;

pub struct Comparator {
    provider: SharedProvider,
}

impl Comparator {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    pub async fn compare(&self, hybrid: &str, microservices: &str, context: &str) -> Result<String> {
        let prompt = PromptBuilder::new()
            .role(
                "software architect",
                "architecture evolution and decision analysis. You reason rigorously and write for expert architects",
            )
            .text(
                "You are given two architecture analyses of the same application. The hybrid \
                 analysis describes a monolithic core alongside some separately deployed \
                 components; the microservices analysis describes the application after its \
                 migration to independently deployed services.",
            )
            .section("THEORETICAL CONTEXT", context)
            .section("ARCHITECTURE ANALYSIS - HYBRID VERSION", hybrid)
            .section("ARCHITECTURE ANALYSIS - MICROSERVICES VERSION", microservices)
            .tasks(&[
                "Identify the most important architecture decisions in the migration from the hybrid version to the microservices version.",
                "For each decision give a brief description, the differences that made it necessary, and its architectural impact.",
            ])
            .rules(
                "RULES",
                &[
                    "Focus on decisions implied by the differences between the versions: migration strategy, decomposition approach, communication style, deployment model, data management".to_string(),
                    "Do not invent technologies or details the analyses do not support".to_string(),
                    format!("At most {} decisions", MAX_DECISIONS),
                    "Well-structured Markdown with one heading per decision, without a surrounding code fence".to_string(),
                ],
            )
            .build("comparison");

        debug!(chars = prompt.char_count(), "Comparison prompt");
        self.provider.invoke(&prompt).await
    }
}
