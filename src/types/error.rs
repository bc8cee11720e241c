//! Error types for the whole crate.
//!
//! Everything funnels into [`AdrError`]. Provider failures carry an
//! [`LlmError`] with an [`ErrorCategory`] so callers and logs can tell a
//! rate limit from a bad key without string matching.
//!
//! Runs are fail-fast: no category is retried. The category exists for
//! reporting only.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// HTTP 429 or quota messages
    RateLimit,
    /// Prompt exceeded the model context window
    TokenLimit,
    /// Rejected credentials
    Auth,
    /// Connection, DNS, or request timeout
    Network,
    /// Unknown model or endpoint
    Unavailable,
    BadRequest,
    /// Structured output could not be parsed or did not match its schema
    ParseError,
    /// 5xx responses
    Transient,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::RateLimit => "RATE_LIMIT",
            Self::TokenLimit => "TOKEN_LIMIT",
            Self::Auth => "AUTH",
            Self::Network => "NETWORK",
            Self::Unavailable => "UNAVAILABLE",
            Self::BadRequest => "BAD_REQUEST",
            Self::ParseError => "PARSE_ERROR",
            Self::Transient => "TRANSIENT",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// A failed model call, tagged with its category and the provider that failed.
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "[{}:{}] {}", provider, self.category, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    /// Structured output that could not be turned into the expected shape
    pub fn parse(message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::with_provider(ErrorCategory::ParseError, message, provider)
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a transport-level failure message (no HTTP status available).
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        let category = if lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("quota")
        {
            ErrorCategory::RateLimit
        } else if lower.contains("context length")
            || lower.contains("maximum context")
            || (lower.contains("token") && lower.contains("limit"))
        {
            ErrorCategory::TokenLimit
        } else if lower.contains("unauthorized")
            || lower.contains("api key")
            || lower.contains("permission denied")
        {
            ErrorCategory::Auth
        } else if lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("network")
        {
            ErrorCategory::Network
        } else if lower.contains("service unavailable") || lower.contains("overloaded") {
            ErrorCategory::Transient
        } else if lower.contains("json") || lower.contains("parse") {
            ErrorCategory::ParseError
        } else {
            ErrorCategory::Unknown
        };

        LlmError::with_provider(category, message, provider)
    }

    /// Classify by HTTP status code.
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 => ErrorCategory::BadRequest,
            404 => ErrorCategory::Unavailable,
            413 => ErrorCategory::TokenLimit,
            500..=599 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, format!("HTTP {}: {}", status, message), provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum AdrError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    /// Missing or invalid configuration; raised before any model call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Archive could not be opened or read
    #[error("Extraction failed for {path}: {message}")]
    Extraction { path: String, message: String },

    #[error("Provider error: {0}")]
    Provider(LlmError),

    /// Failure inside a workflow step, tagged with the step name
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<AdrError>,
    },

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<LlmError> for AdrError {
    fn from(err: LlmError) -> Self {
        AdrError::Provider(err)
    }
}

pub type Result<T> = std::result::Result<T, AdrError>;

impl AdrError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn extraction(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Tag an error with the workflow step it came from.
    pub fn in_step(self, step: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any step wrappers.
    pub fn root_cause(&self) -> &AdrError {
        match self {
            Self::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Provider error details, if this (possibly step-wrapped) error came from a model call.
    pub fn as_provider_error(&self) -> Option<&LlmError> {
        match self.root_cause() {
            Self::Provider(err) => Some(err),
            _ => None,
        }
    }
}

/// Attach a human-readable context to foreign errors.
pub trait ResultExt<T> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| AdrError::Storage(format!("{}: {}", context.into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::ParseError.to_string(), "PARSE_ERROR");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_classify_http_status() {
        let cases = [
            (429, ErrorCategory::RateLimit),
            (401, ErrorCategory::Auth),
            (403, ErrorCategory::Auth),
            (400, ErrorCategory::BadRequest),
            (404, ErrorCategory::Unavailable),
            (503, ErrorCategory::Transient),
            (418, ErrorCategory::Unknown),
        ];
        for (status, expected) in cases {
            let err = ErrorClassifier::classify_http_status(status, "body", "groq");
            assert_eq!(err.category, expected, "status {}", status);
            assert_eq!(err.provider.as_deref(), Some("groq"));
        }
    }

    #[test]
    fn test_classify_transport_messages() {
        assert_eq!(
            ErrorClassifier::classify("operation timed out", "openai").category,
            ErrorCategory::Network
        );
        assert_eq!(
            ErrorClassifier::classify("Too many requests", "openai").category,
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ErrorClassifier::classify("something odd", "openai").category,
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "slow down", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] slow down");

        let bare = LlmError::new(ErrorCategory::Network, "offline");
        assert_eq!(bare.to_string(), "[NETWORK] offline");
    }

    #[test]
    fn test_step_wrapping_keeps_root_cause() {
        let err = AdrError::from(LlmError::new(ErrorCategory::Auth, "bad key"))
            .in_step("do_architecture_diff");

        assert!(err.to_string().contains("do_architecture_diff"));
        assert!(matches!(err.root_cause(), AdrError::Provider(_)));
        assert_eq!(
            err.as_provider_error().map(|e| e.category),
            Some(ErrorCategory::Auth)
        );
    }

    #[test]
    fn test_configuration_error_is_not_provider_error() {
        let err = AdrError::Configuration("Unknown provider: mistral".into());
        assert!(err.as_provider_error().is_none());
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown provider: mistral"
        );
    }
}
