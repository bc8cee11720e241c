//! Analysis Agents
//!
//! Stateless request/response units: each one renders a prompt from its
//! inputs and makes a single model call through the shared provider.

mod code_analyzer;
mod comparator;
mod context;
mod infra_analyzer;
mod record_generator;
mod schemas;

pub use code_analyzer::{CodeAnalyzer, CodeInputs};
pub use comparator::Comparator;
pub use context::{ContextGenerator, ContextMode};
pub use infra_analyzer::{ClassificationResult, InfraAnalyzer, InfraInputs};
pub use record_generator::{GeneratedRecords, RecordGenerator};
pub use schemas::AgentSchemas;

#[cfg(test)]
pub(crate) use record_generator::raw_record_json;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{LlmError, Result};

/// Deserialize structured output strictly; any mismatch is a parse error.
fn conform<T: DeserializeOwned>(value: Value, what: &str, provider: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        LlmError::parse(format!("{} do not match the schema: {}", what, e), provider).into()
    })
}
