//! Prompt Builder
//!
//! Agents assemble their requests from named input sections, a numbered task
//! list, and optional output rules. The role sentence becomes the system
//! message; everything else becomes the user message.

use crate::ai::provider::Prompt;

/// Placeholder written for inputs that are empty (disabled or missing).
pub const EMPTY_SECTION: &str = "(not provided)";

#[derive(Debug, Clone)]
enum Block {
    Section { header: String, content: String },
    Code { language: String, content: String },
    Tasks(Vec<String>),
    Rules { header: String, rules: Vec<String> },
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    role: Option<String>,
    blocks: Vec<Block>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// System role, e.g. `role("software architect", "Infrastructure as Code")`.
    pub fn role(mut self, expertise: &str, specialty: &str) -> Self {
        self.role = Some(format!(
            "You are an expert {} specializing in {}.",
            expertise, specialty
        ));
        self
    }

    /// Free-form system message, replacing any role sentence.
    pub fn system(mut self, text: &str) -> Self {
        self.role = Some(text.to_string());
        self
    }

    /// Titled input section. Empty content is replaced by a placeholder.
    pub fn section(mut self, header: &str, content: &str) -> Self {
        let content = if content.trim().is_empty() {
            EMPTY_SECTION.to_string()
        } else {
            content.trim_end().to_string()
        };
        self.blocks.push(Block::Section {
            header: header.to_string(),
            content,
        });
        self
    }

    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.blocks.push(Block::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Numbered task list.
    pub fn tasks<S: AsRef<str>>(mut self, tasks: &[S]) -> Self {
        self.blocks.push(Block::Tasks(
            tasks.iter().map(|t| t.as_ref().to_string()).collect(),
        ));
        self
    }

    /// Bulleted rule list under its own header.
    pub fn rules<S: AsRef<str>>(mut self, header: &str, rules: &[S]) -> Self {
        self.blocks.push(Block::Rules {
            header: header.to_string(),
            rules: rules.iter().map(|r| r.as_ref().to_string()).collect(),
        });
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.blocks.push(Block::Text(content.to_string()));
        self
    }

    /// Render the user message.
    pub fn render_user(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Section { header, content } => {
                    out.push_str(&format!("## {}\n{}\n\n", header, content));
                }
                Block::Code { language, content } => {
                    out.push_str(&format!("```{}\n{}\n```\n\n", language, content));
                }
                Block::Tasks(tasks) => {
                    out.push_str("## TASKS\n");
                    for (i, task) in tasks.iter().enumerate() {
                        out.push_str(&format!("{}. {}\n", i + 1, task));
                    }
                    out.push('\n');
                }
                Block::Rules { header, rules } => {
                    out.push_str(&format!("## {}\n", header));
                    for rule in rules {
                        out.push_str(&format!("- {}\n", rule));
                    }
                    out.push('\n');
                }
                Block::Text(text) => {
                    out.push_str(text);
                    out.push_str("\n\n");
                }
            }
        }
        out.trim_end().to_string()
    }

    pub fn build(self, label: impl Into<String>) -> Prompt {
        let user = self.render_user();
        Prompt::new(label, self.role.unwrap_or_default(), user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_goes_to_system_message() {
        let prompt = PromptBuilder::new()
            .role("software architect", "cloud-native microservices")
            .section("TERRAFORM CODE", "resource \"aws_ecs_service\" \"api\" {}")
            .build("infra_analysis:minor");

        assert_eq!(
            prompt.system,
            "You are an expert software architect specializing in cloud-native microservices."
        );
        assert!(prompt.user.starts_with("## TERRAFORM CODE\nresource"));
        assert_eq!(prompt.label, "infra_analysis:minor");
    }

    #[test]
    fn test_empty_section_gets_placeholder() {
        let user = PromptBuilder::new()
            .section("THEORETICAL CONTEXT", "  ")
            .render_user();
        assert_eq!(user, format!("## THEORETICAL CONTEXT\n{}", EMPTY_SECTION));
    }

    #[test]
    fn test_tasks_are_numbered_and_rules_bulleted() {
        let user = PromptBuilder::new()
            .tasks(&["Decide", "Justify"])
            .rules("RULES", &["Cite [R#]"])
            .render_user();

        assert!(user.contains("## TASKS\n1. Decide\n2. Justify\n"));
        assert!(user.ends_with("## RULES\n- Cite [R#]"));
    }

    #[test]
    fn test_code_block() {
        let user = PromptBuilder::new().code("python", "print(1)").render_user();
        assert_eq!(user, "```python\nprint(1)\n```");
    }
}
