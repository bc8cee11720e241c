//! AI Integration Layer
//!
//! Hosted model access, prompt assembly, and structured-output parsing.

pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod validation;

pub use prompt::PromptBuilder;
pub use provider::{
    LlmBackend, LlmProvider, Prompt, ProviderConfig, SharedProvider, create, create_provider,
};
pub use timeout::{with_optional_timeout, with_timeout};
pub use validation::{JsonExtractor, extract_json_from_response};
