//! Theoretical architecture context shared by every agent prompt.

use tracing::{debug, info};

use crate::ai::{PromptBuilder, SharedProvider};
use crate::types::Result;

/// How the context text is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    /// No context; prompts show the section as not provided
    Disabled,
    /// Built-in introduction
    Static,
    /// One model call
    Generated,
}

impl ContextMode {
    pub fn from_flags(include_knowledge: bool, reuse_context: bool) -> Self {
        match (include_knowledge, reuse_context) {
            (false, _) => Self::Disabled,
            (true, true) => Self::Static,
            (true, false) => Self::Generated,
        }
    }
}

pub struct ContextGenerator {
    provider: SharedProvider,
}

impl ContextGenerator {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, mode: ContextMode) -> Result<String> {
        match mode {
            ContextMode::Disabled => Ok(String::new()),
            ContextMode::Static => Ok(STATIC_CONTEXT.trim().to_string()),
            ContextMode::Generated => {
                info!("Generating theoretical context with {}", self.provider.name());
                let prompt = PromptBuilder::new()
                    .system(
                        "You are an expert software architect. Generate comprehensive theoretical \
                         context about software architecture, monolithic architecture, and \
                         microservices architecture.",
                    )
                    .text(
                        "Generate a detailed theoretical introduction to software architecture, \
                         monolithic architecture, and microservices architecture. Format as Markdown.",
                    )
                    .build("context");
                let text = self.provider.invoke(&prompt).await?;
                debug!(chars = text.len(), "Theoretical context generated");
                Ok(text)
            }
        }
    }
}

const STATIC_CONTEXT: &str = r#"
# Software Architecture

Software architecture is the set of fundamental structures of a system: its
components, the connectors between them, and the principles that govern how
they are designed and evolve. It is the main vehicle for reaching quality
attributes such as scalability, maintainability, performance, security and
reliability, and for reasoning about trade-offs early.

Core elements:
- **Components:** units of functionality behind well-defined interfaces.
- **Connectors:** the mechanisms components use to interact (calls, messages, events).
- **Configuration:** the topology formed by components and connectors.
- **Views:** logical, process, development and physical perspectives for different stakeholders.

Common styles include layered, client-server, event-driven, service-oriented,
monolithic and microservices architectures.

---

# Monolithic Architecture

A monolith packages all functionality (user interface, business logic and data
access) in one codebase that is built, tested and deployed as a single unit,
usually on top of one shared database.

Strengths:
- **Simplicity:** one codebase and one artifact to develop, test and release.
- **Performance:** in-process calls avoid network hops.
- **End-to-end testing:** the whole system runs in one place.

Weaknesses:
- **Coarse scaling:** the whole application scales together.
- **Coupling:** modules share memory, schema and release cadence.
- **Fault propagation:** a defect in one module can take down the whole process.
- **Technology lock-in:** adopting new technology must happen everywhere at once.

Monoliths fit small and medium systems and early-stage products.

---

# Microservices Architecture

Microservices structure an application as a set of small, loosely coupled
services, each owning one business capability and deployed independently.
Services communicate over lightweight protocols such as HTTP APIs or messaging.

Characteristics:
- **Independent deployment and scaling** per service.
- **Decentralized data:** each service owns its storage.
- **Technology diversity:** each team picks the stack that suits its service.
- **Automation:** CI/CD pipelines, service discovery and observability are prerequisites.

Strengths include fault isolation, targeted scaling and team autonomy. Costs
include operational complexity, network latency, distributed data consistency
and harder end-to-end testing.

---

# Comparison

| Aspect | Monolithic | Microservices |
|--------|------------|---------------|
| Structure | Single codebase | Many independent services |
| Deployment | One unit | Per service |
| Scaling | Whole application | Per service |
| Data | Shared database | Database per service |
| Fault isolation | Weak | Strong |
| Operational complexity | Low | High |

The right choice depends on domain complexity, team size, scaling needs and
operational maturity; many systems evolve from a monolith through a hybrid
stage towards services.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::ScriptedProvider;
    use std::sync::Arc;

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(ContextMode::from_flags(false, true), ContextMode::Disabled);
        assert_eq!(ContextMode::from_flags(true, true), ContextMode::Static);
        assert_eq!(ContextMode::from_flags(true, false), ContextMode::Generated);
    }

    #[tokio::test]
    async fn test_static_and_disabled_make_no_calls() {
        let provider = Arc::new(ScriptedProvider::new());
        let generator = ContextGenerator::new(provider.clone());

        assert_eq!(generator.generate(ContextMode::Disabled).await.unwrap(), "");
        let text = generator.generate(ContextMode::Static).await.unwrap();
        assert!(text.starts_with("# Software Architecture"));
        assert!(text.contains("# Microservices Architecture"));
        assert_eq!(provider.call_count("context"), 0);
    }

    #[tokio::test]
    async fn test_generated_context_uses_provider() {
        let provider = Arc::new(ScriptedProvider::new().with_text("context", "# Generated"));
        let generator = ContextGenerator::new(provider.clone());

        let text = generator.generate(ContextMode::Generated).await.unwrap();
        assert_eq!(text, "# Generated");
        assert_eq!(provider.call_count("context"), 1);
    }
}
