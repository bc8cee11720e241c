pub mod error;
pub mod utils;

pub use error::{AdrError, ErrorCategory, ErrorClassifier, LlmError, Result, ResultExt};
pub use utils::{char_len, estimate_tokens, truncate_chars};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Domain Newtypes
// =============================================================================

/// Identifier of one workflow execution and its checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// Evolution Stage
// =============================================================================

/// One of the two snapshots being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Earlier, hybrid snapshot
    Minor,
    /// Later, microservices snapshot
    Major,
}

impl Stage {
    pub const ALL: [Stage; 2] = [Stage::Minor, Stage::Major];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }

    /// Short architecture label used in prompts.
    pub fn version_type(&self) -> &'static str {
        match self {
            Self::Minor => "hybrid",
            Self::Major => "microservices-based",
        }
    }

    /// Longer architecture label used in prompt headings.
    pub fn version_description(&self) -> &'static str {
        match self {
            Self::Minor => "hybrid (monolith + microservices)",
            Self::Major => "microservices-based",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = AdrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            other => Err(AdrError::Configuration(format!(
                "Unknown stage '{}'. Valid values: minor, major",
                other
            ))),
        }
    }
}
