//! adrsynth - Architecture Decision Records from Architecture Evolution
//!
//! Compares two snapshots of the same application (an earlier hybrid stage and
//! a later microservices stage), each given as Terraform plus an optional
//! source archive, and asks a hosted language model to describe the migration
//! as a handful of Architecture Decision Records.
//!
//! ## Core Features
//!
//! - **Step Graph**: fixed DAG of analysis steps with fan-out/fan-in parallelism
//! - **Providers**: OpenAI, Groq and Gemini behind one [`ai::LlmProvider`] trait
//! - **Archive Sampling**: bounded, deterministic source extraction with summaries
//! - **Checkpoint/Resume**: full run state saved to SQLite after every step
//!
//! ## Quick Start
//!
//! ```ignore
//! use adrsynth::{AdrWorkflow, ConfigLoader, SqliteCheckpointStore, WorkflowOptions};
//!
//! let config = ConfigLoader::load_project(&project_dir)?;
//! let settings = ConfigLoader::load_provider_settings(&config.llm)?;
//! let provider = adrsynth::ai::create(&settings.llm_provider, &settings)?;
//! let store = Arc::new(SqliteCheckpointStore::open(&db_path)?);
//! let workflow = AdrWorkflow::new(provider, &project_dir, config, store, WorkflowOptions::default());
//! let state = workflow.run().await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: provider abstraction, prompt assembly, JSON extraction
//! - [`extractor`]: archive reading, classification, sampling
//! - [`agents`]: the analysis agents
//! - [`adr`]: decision record model, rendering, parsing, export
//! - [`workflow`]: step graph, state, checkpoints
//! - [`config`]: project and provider configuration

pub mod adr;
pub mod agents;
pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod extractor;
pub mod types;
pub mod workflow;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{ConfigLoader, ProjectConfig, ProviderSettings};
pub use types::{AdrError, ErrorCategory, LlmError, Result, ResultExt, RunId, Stage};

pub use adr::{AdrStatus, DecisionRecord};
pub use ai::{LlmProvider, SharedProvider};
pub use workflow::{
    AdrWorkflow, CheckpointStore, MemoryCheckpointStore, SqliteCheckpointStore, WorkflowFlags,
    WorkflowOptions, WorkflowState, WorkflowStep,
};
