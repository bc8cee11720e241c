//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// File and directory names
pub mod paths {
    /// Per-project configuration file, looked up in the project directory
    pub const PROJECT_CONFIG_FILE: &str = "project-config.yaml";

    /// Default directory (under the project) for generated records
    pub const DEFAULT_OUTPUT_DIR: &str = "output-adrs";

    /// Working directory for run state
    pub const STATE_DIR: &str = ".adrsynth";

    /// Checkpoint database inside [`STATE_DIR`]
    pub const CHECKPOINT_DB: &str = "checkpoints.db";

    /// Global provider settings file inside the user config directory
    pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

    pub const DEFAULT_TERRAFORM_MINOR: &str = "cloud_evolucion_menor.tf";
    pub const DEFAULT_TERRAFORM_MAJOR: &str = "cloud_evolucion_mayor.tf";
    pub const DEFAULT_SOURCE_ARCHIVE: &str = "app.zip";
    pub const DEFAULT_KNOWLEDGE_BASE: &str = "knowledge/IAC.txt";
}

/// Source extraction limits
pub mod extraction {
    /// Default number of source files sampled from an archive
    pub const DEFAULT_MAX_FILES: usize = 10;

    /// Default per-file size (characters) above which a file is summarized
    pub const DEFAULT_MAX_FILE_SIZE: usize = 5000;

    /// Heuristic used for the "~N tokens" annotation in summary prompts
    pub const CHARS_PER_TOKEN: usize = 4;

    /// Extensions considered source code when sampling
    pub const CODE_EXTENSIONS: &[&str] = &[".py", ".ts", ".tsx", ".js", ".java", ".xml", ".php"];

    /// Infrastructure extension, sampled alongside code
    pub const TERRAFORM_EXTENSION: &str = ".tf";

    /// Exact file names classified as project configuration
    pub const CONFIG_FILE_NAMES: &[&str] = &[
        "requirements.txt",
        "pyproject.toml",
        "setup.py",
        "package.json",
        "tsconfig.json",
        "Dockerfile",
        "pom.xml",
        "build.gradle",
        "gradle.properties",
        "composer.json",
        "composer.lock",
    ];

    /// Decompressed bytes read from one archive entry at most
    pub const MAX_ENTRY_BYTES: u64 = 8 * 1024 * 1024;

    pub const MISSING_SOURCE_NOTE: &str = "Source code not available";

    /// Summaries requested at once per archive
    pub const SUMMARY_CONCURRENCY: usize = 4;
}

/// Decision record limits
pub mod records {
    /// Upper bound on records produced per run
    pub const MAX_RECORDS: usize = 5;

    /// Upper bound on decisions the comparator is asked for
    pub const MAX_DECISIONS: usize = 5;

    pub const DEFAULT_VALIDATION: &str = "Validation to be defined in future iterations.";
}

/// LLM provider defaults
pub mod llm {
    pub const DEFAULT_PROVIDER: &str = "openai";

    /// Model written into synthesized project configs
    pub const DEFAULT_PROJECT_MODEL: &str = "gpt-4o";
    pub const DEFAULT_PROJECT_TEMPERATURE: f32 = 0.3;
    pub const DEFAULT_PROJECT_MAX_TOKENS: u32 = 2000;

    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
    pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;

    /// HTTP request timeout for a single model call (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Environment variables read for provider settings
    pub const ENV_KEYS: &[&str] = &[
        "LLM_PROVIDER",
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "OPENAI_BASE_URL",
        "GROQ_API_KEY",
        "GROQ_MODEL",
        "GOOGLE_API_KEY",
        "GEMINI_MODEL",
        "TEMPERATURE",
        "MAX_TOKENS",
        "LLM_TIMEOUT_SECS",
    ];
}
