//! LLM summaries of source files that exceed the size limit.

use crate::ai::{PromptBuilder, SharedProvider};
use crate::types::{Result, estimate_tokens};

use super::classify::FileCategory;

/// What the summary of each file type should cover.
fn summary_tasks(category: FileCategory) -> &'static [&'static str] {
    match category {
        FileCategory::Python => &[
            "State the module's main purpose and responsibility",
            "List key classes and what each is responsible for",
            "List key functions and their purposes",
            "Note important imports and external dependencies",
            "Note architectural or design patterns in use",
            "Identify communication patterns (API calls, database access, messaging)",
        ],
        FileCategory::TypeScript => &[
            "State the module's main purpose and responsibility",
            "List key interfaces and types and their roles",
            "List key classes and functions with their purposes",
            "Note important imports and external dependencies",
            "Note architectural or design patterns in use",
            "Identify communication patterns (API calls, database access, messaging)",
        ],
        FileCategory::Tsx => &[
            "State the component's main purpose and responsibility",
            "List key props and interfaces with their types",
            "List key state variables and what they hold",
            "Note important imports (React hooks, libraries)",
            "Note architectural or design patterns in use",
            "Identify communication patterns (API calls, event handlers, parent-child data flow)",
            "List key child components and their roles",
        ],
        FileCategory::JavaScript => &[
            "State the module's main purpose and responsibility",
            "List key functions and their purposes",
            "Note important imports and external dependencies",
            "Note architectural or design patterns in use",
            "Identify communication patterns (API calls, database access, messaging)",
        ],
        FileCategory::Php => &[
            "State the module's main purpose and responsibility",
            "List key classes and interfaces and their responsibilities",
            "List key functions and methods with their purposes",
            "Note important use statements and external dependencies",
            "Note architectural or design patterns in use",
            "Identify communication patterns (API calls, database access, HTTP requests)",
        ],
        FileCategory::Java => &[
            "State the class or module's main purpose and responsibility",
            "List key classes and interfaces and their responsibilities",
            "List key methods and their purposes",
            "Note important imports and external dependencies",
            "Note architectural or design patterns in use",
            "Identify communication patterns (API calls, database access, messaging)",
        ],
        FileCategory::Xml => &[
            "State the purpose and overall structure of the document",
            "List key elements and their roles",
            "Note important attributes and configuration values",
            "Note references to other files or dependencies",
            "Identify the schema or structure in use",
        ],
        FileCategory::Terraform => &[
            "List the main resources defined",
            "List key modules and their purposes",
            "Identify the cloud services in use",
            "Note networking and security configuration",
            "Identify communication paths between resources",
        ],
        FileCategory::Config | FileCategory::Other => &[
            "State the main purpose and responsibility",
            "List key components and their roles",
            "Note important dependencies",
            "Note architectural patterns",
        ],
    }
}

#[derive(Clone)]
pub struct CodeSummarizer {
    provider: SharedProvider,
}

impl CodeSummarizer {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    /// Ask the model for a structured summary of `content` aimed at `target_size` characters.
    pub async fn summarize(&self, path: &str, content: &str, target_size: usize) -> Result<String> {
        let category = FileCategory::from_path(path);
        let prompt = PromptBuilder::new()
            .system(
                "You are an expert software architect specializing in code analysis and \
                 architectural pattern recognition. You write concise, structured summaries \
                 that keep the architecturally relevant information.",
            )
            .text(&format!(
                "Summarize the following {} file for architectural analysis.\n\nFile: {}\nApproximate size: {} characters (~{} tokens)",
                category.language_name(),
                path,
                content.len(),
                estimate_tokens(content)
            ))
            .tasks(summary_tasks(category))
            .rules(
                "OUTPUT",
                &[
                    format!("Keep the summary under {} characters", target_size),
                    "Use structured text with clear sections".to_string(),
                ],
            )
            .section("CODE TO SUMMARIZE", content)
            .build(format!("summary:{}", path));

        self.provider.invoke(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::ScriptedProvider;
    use std::sync::Arc;

    #[test]
    fn test_every_category_has_tasks() {
        for category in FileCategory::ALL {
            assert!(!summary_tasks(category).is_empty());
        }
        assert_eq!(summary_tasks(FileCategory::Tsx).len(), 7);
    }

    #[tokio::test]
    async fn test_summary_prompt_mentions_file_type_and_limit() {
        let provider = Arc::new(ScriptedProvider::new().with_text("summary", "short summary"));
        let summarizer = CodeSummarizer::new(provider.clone());

        let summary = summarizer
            .summarize("web/App.tsx", &"x".repeat(400), 120)
            .await
            .unwrap();
        assert_eq!(summary, "short summary");

        let prompt = provider.prompt_for("summary:web/App.tsx").unwrap();
        assert!(prompt.user.contains("TypeScript React (TSX) file"));
        assert!(prompt.user.contains("~100 tokens"));
        assert!(prompt.user.contains("Keep the summary under 120 characters"));
        assert!(prompt.system.contains("architectural pattern recognition"));
    }
}
