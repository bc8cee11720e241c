//! LLM Provider Abstraction
//!
//! Defines the [`LlmProvider`] trait with free-text and structured calls, and
//! the closed set of hosted backends ([`LlmBackend`]).
//!
//! ## Backends
//!
//! - `openai`: OpenAI Chat Completions (custom base URL allowed)
//! - `groq`: Groq's OpenAI-compatible endpoint
//! - `gemini`: Google Generative Language `generateContent`

mod gemini;
mod openai;
mod prompt_utils;
#[cfg(test)]
pub(crate) mod testing;

pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatibleProvider;
pub use prompt_utils::build_schema_prompt;

pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ProviderSettings;
use crate::constants::llm;
use crate::types::{AdrError, Result};

// =============================================================================
// Prompt
// =============================================================================

/// A single model request: system instructions plus the user message.
///
/// `label` names the calling agent for logs ("infra_analysis:minor", ...).
#[derive(Debug, Clone)]
pub struct Prompt {
    pub label: String,
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(label: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            system: system.into(),
            user: user.into(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.system.len() + self.user.len()
    }
}

/// Token usage reported by a provider, logged at debug level
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Free-text completion.
    async fn invoke(&self, prompt: &Prompt) -> Result<String>;

    /// Completion constrained to `schema`; returns the parsed JSON value.
    async fn invoke_structured(&self, prompt: &Prompt, schema: &Value) -> Result<Value>;

    /// Provider name for logging
    fn name(&self) -> &str;

    fn model(&self) -> &str;
}

/// Shared provider handle; every agent in a run calls through the same one.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// One variant per supported provider, carrying only that provider's fields.
#[derive(Clone)]
pub enum LlmBackend {
    OpenAi {
        api_key: String,
        model: String,
        base_url: Option<String>,
    },
    Groq {
        api_key: String,
        model: String,
    },
    Gemini {
        api_key: String,
        model: String,
    },
}

impl std::fmt::Debug for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi {
                model, base_url, ..
            } => f
                .debug_struct("OpenAi")
                .field("api_key", &"[REDACTED]")
                .field("model", model)
                .field("base_url", base_url)
                .finish(),
            Self::Groq { model, .. } => f
                .debug_struct("Groq")
                .field("api_key", &"[REDACTED]")
                .field("model", model)
                .finish(),
            Self::Gemini { model, .. } => f
                .debug_struct("Gemini")
                .field("api_key", &"[REDACTED]")
                .field("model", model)
                .finish(),
        }
    }
}

impl LlmBackend {
    pub const SUPPORTED: &'static [&'static str] = &["openai", "groq", "gemini"];

    /// Pick the backend named `provider` and pull its credentials from `settings`.
    pub fn from_settings(provider: &str, settings: &ProviderSettings) -> Result<Self> {
        let require = |key: &Option<String>, var: &str| {
            key.clone().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AdrError::Configuration(format!(
                    "{} API key not found. Set {} or add it to the global config",
                    provider, var
                ))
            })
        };

        match provider.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi {
                api_key: require(&settings.openai_api_key, "OPENAI_API_KEY")?,
                model: settings.openai_model.clone(),
                base_url: settings
                    .openai_base_url
                    .as_deref()
                    .map(validate_base_url)
                    .transpose()?,
            }),
            "groq" => Ok(Self::Groq {
                api_key: require(&settings.groq_api_key, "GROQ_API_KEY")?,
                model: settings.groq_model.clone(),
            }),
            "gemini" => Ok(Self::Gemini {
                api_key: require(&settings.google_api_key, "GOOGLE_API_KEY")?,
                model: settings.gemini_model.clone(),
            }),
            other => Err(AdrError::Configuration(format!(
                "Unknown provider: {}. Supported: {}",
                other,
                Self::SUPPORTED.join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Groq { .. } => "groq",
            Self::Gemini { .. } => "gemini",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi { model, .. } | Self::Groq { model, .. } | Self::Gemini { model, .. } => {
                model
            }
        }
    }
}

fn validate_base_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| AdrError::Configuration(format!("Invalid OPENAI_BASE_URL '{}': {}", raw, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        scheme => Err(AdrError::Configuration(format!(
            "OPENAI_BASE_URL must use http or https, got {}",
            scheme
        ))),
    }
}

/// Backend plus the sampling parameters shared by every backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub backend: LlmBackend,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            backend: LlmBackend::from_settings(&settings.llm_provider, settings)?,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout_secs: settings.llm_timeout_secs,
        })
    }
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    let provider: SharedProvider = match &config.backend {
        LlmBackend::OpenAi {
            api_key,
            model,
            base_url,
        } => Arc::new(OpenAiCompatibleProvider::new(
            "openai",
            api_key,
            model,
            base_url.as_deref().unwrap_or(llm::OPENAI_BASE_URL),
            config,
        )?),
        LlmBackend::Groq { api_key, model } => Arc::new(OpenAiCompatibleProvider::new(
            "groq",
            api_key,
            model,
            llm::GROQ_BASE_URL,
            config,
        )?),
        LlmBackend::Gemini { api_key, model } => {
            Arc::new(GeminiProvider::new(api_key, model, config)?)
        }
    };
    Ok(provider)
}

/// Resolve `provider_name` against `settings` and build the handle.
pub fn create(provider_name: &str, settings: &ProviderSettings) -> Result<SharedProvider> {
    let config = ProviderConfig {
        backend: LlmBackend::from_settings(provider_name, settings)?,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        timeout_secs: settings.llm_timeout_secs,
    };
    create_provider(&config)
}
