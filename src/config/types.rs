//! Configuration Types
//!
//! [`ProjectConfig`] mirrors `project-config.yaml`. [`ProviderSettings`] holds
//! the credentials and sampling knobs resolved from the environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{extraction, llm, paths};
use crate::types::{AdrError, Result, Stage};

// =============================================================================
// Project Configuration
// =============================================================================

/// Per-project settings. Relative paths are resolved against the project directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub project_name: String,
    pub terraform_minor: String,
    pub terraform_major: String,

    /// Archive shared by both stages when no per-stage archive is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code_zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code_zip_minor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code_zip_major: Option<String>,

    pub knowledge_base: String,
    pub llm: LlmConfig,
    pub context_generation: ContextGenerationConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: "project".to_string(),
            terraform_minor: paths::DEFAULT_TERRAFORM_MINOR.to_string(),
            terraform_major: paths::DEFAULT_TERRAFORM_MAJOR.to_string(),
            source_code_zip: None,
            source_code_zip_minor: None,
            source_code_zip_major: None,
            knowledge_base: paths::DEFAULT_KNOWLEDGE_BASE.to_string(),
            llm: LlmConfig::default(),
            context_generation: ContextGenerationConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Field-level fallbacks applied under a user-written config file.
    pub fn base_for(project_dir: &Path) -> Self {
        Self {
            project_name: directory_name(project_dir),
            ..Self::default()
        }
    }

    /// The full configuration used when no config file exists.
    pub fn synthesized_for(project_dir: &Path) -> Self {
        Self {
            source_code_zip: Some(paths::DEFAULT_SOURCE_ARCHIVE.to_string()),
            llm: LlmConfig::synthesized(),
            ..Self::base_for(project_dir)
        }
    }

    /// Archive configured for `stage`; per-stage keys win over the shared one.
    pub fn source_archive(&self, stage: Stage) -> Option<&str> {
        let specific = match stage {
            Stage::Minor => self.source_code_zip_minor.as_deref(),
            Stage::Major => self.source_code_zip_major.as_deref(),
        };
        specific.or(self.source_code_zip.as_deref())
    }

    pub fn terraform(&self, stage: Stage) -> &str {
        match stage {
            Stage::Minor => &self.terraform_minor,
            Stage::Major => &self.terraform_major,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(AdrError::Configuration(
                "project_name must not be empty".to_string(),
            ));
        }
        if self.project_name.contains(['/', '\\']) || self.project_name.contains("..") {
            return Err(AdrError::Configuration(format!(
                "project_name '{}' must not contain path separators or '..'",
                self.project_name
            )));
        }
        if self.context_generation.max_files == 0 {
            return Err(AdrError::Configuration(
                "context_generation.max_files must be greater than 0".to_string(),
            ));
        }
        if self.context_generation.max_file_size == 0 {
            return Err(AdrError::Configuration(
                "context_generation.max_file_size must be greater than 0".to_string(),
            ));
        }
        if let Some(temperature) = self.llm.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(AdrError::Configuration(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                temperature
            )));
        }
        Ok(())
    }
}

fn directory_name(dir: &Path) -> String {
    let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    canonical
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .unwrap_or_else(|| "project".to_string())
}

/// Resolve a configured path against the project directory.
pub fn resolve_path(project_dir: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}

// =============================================================================
// LLM Section
// =============================================================================

/// The `llm` section of a project config. Unset keys defer to the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmConfig {
    fn synthesized() -> Self {
        Self {
            provider: Some(llm::DEFAULT_PROVIDER.to_string()),
            model: Some(llm::DEFAULT_PROJECT_MODEL.to_string()),
            temperature: Some(llm::DEFAULT_PROJECT_TEMPERATURE),
            max_tokens: Some(llm::DEFAULT_PROJECT_MAX_TOKENS),
        }
    }
}

// =============================================================================
// Context Generation Section
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextGenerationConfig {
    /// Number of source files sampled per archive
    pub max_files: usize,
    /// Characters above which a file is summarized (or flagged)
    pub max_file_size: usize,
    pub summarize_large_files: bool,
}

impl Default for ContextGenerationConfig {
    fn default() -> Self {
        Self {
            max_files: extraction::DEFAULT_MAX_FILES,
            max_file_size: extraction::DEFAULT_MAX_FILE_SIZE,
            summarize_large_files: true,
        }
    }
}

// =============================================================================
// Provider Settings
// =============================================================================

/// Flat provider settings; field names match the environment variables
/// (`OPENAI_API_KEY` -> `openai_api_key`).
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    pub llm_provider: String,

    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,

    pub groq_api_key: Option<String>,
    pub groq_model: String,

    pub google_api_key: Option<String>,
    pub gemini_model: String,

    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub llm_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            llm_provider: llm::DEFAULT_PROVIDER.to_string(),
            openai_api_key: None,
            openai_model: llm::DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: None,
            groq_api_key: None,
            groq_model: llm::DEFAULT_GROQ_MODEL.to_string(),
            google_api_key: None,
            gemini_model: llm::DEFAULT_GEMINI_MODEL.to_string(),
            temperature: llm::DEFAULT_TEMPERATURE,
            max_tokens: None,
            llm_timeout_secs: llm::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ProviderSettings")
            .field("llm_provider", &self.llm_provider)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("groq_api_key", &redact(&self.groq_api_key))
            .field("groq_model", &self.groq_model)
            .field("google_api_key", &redact(&self.google_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .finish()
    }
}

impl ProviderSettings {
    /// Set the model of whichever provider is currently selected.
    pub fn set_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        match self.llm_provider.to_lowercase().as_str() {
            "groq" => self.groq_model = model,
            "gemini" => self.gemini_model = model,
            _ => self.openai_model = model,
        }
    }

    /// Model of the selected provider.
    pub fn model(&self) -> &str {
        match self.llm_provider.to_lowercase().as_str() {
            "groq" => &self.groq_model,
            "gemini" => &self.gemini_model,
            _ => &self.openai_model,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AdrError::Configuration(format!(
                "TEMPERATURE must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.llm_timeout_secs == 0 {
            return Err(AdrError::Configuration(
                "LLM_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
