//! Generate Command
//!
//! Run the decision-record workflow for a project and write the results.
//!
//! Usage:
//!   adrsynth generate <PROJECT_DIR> [--output DIR] [--provider P] [--model M]
//!   adrsynth generate <PROJECT_DIR> --resume <RUN_ID>

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::adr::write_outputs;
use crate::ai;
use crate::cli::Output;
use crate::config::{ConfigLoader, ProviderSettings};
use crate::constants::paths;
use crate::types::{AdrError, Result, RunId};
use crate::workflow::{
    AdrWorkflow, MemoryCheckpointStore, SharedCheckpointStore, SqliteCheckpointStore,
    WorkflowFlags, WorkflowOptions, WorkflowState,
};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub project_dir: PathBuf,
    /// Defaults to `{project_dir}/output-adrs`
    pub output: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub no_terraform: bool,
    pub regenerate_context: bool,
    pub no_knowledge: bool,
    pub json: bool,
    pub resume: Option<String>,
    pub no_checkpoint: bool,
    pub step_timeout_secs: Option<u64>,
    pub quiet: bool,
}

impl GenerateOptions {
    fn flags(&self) -> WorkflowFlags {
        WorkflowFlags {
            include_terraform: !self.no_terraform,
            reuse_context: !self.regenerate_context,
            include_knowledge: !self.no_knowledge,
        }
    }

    fn output_dir(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.project_dir.join(paths::DEFAULT_OUTPUT_DIR))
    }
}

pub fn run(options: GenerateOptions) -> Result<()> {
    let output = Output::quiet(options.quiet);
    let project_dir = options.project_dir.as_path();
    if !project_dir.is_dir() {
        return Err(AdrError::Configuration(format!(
            "Project directory not found: {}",
            project_dir.display()
        )));
    }

    let config = ConfigLoader::load_project(project_dir)?;
    let settings = resolve_settings(&config.llm, &options)?;
    let provider = ai::create(&settings.llm_provider, &settings)?;
    let store = open_store(project_dir, options.no_checkpoint)?;

    output.header(&format!("Generating ADRs for {}", config.project_name));
    output.field("Provider", format!("{} ({})", provider.name(), provider.model()));
    output.field("Infrastructure", enabled(!options.no_terraform));
    output.field(
        "Context",
        match (options.no_knowledge, options.regenerate_context) {
            (true, _) => "disabled",
            (false, true) => "regenerated",
            (false, false) => "built-in",
        },
    );

    let workflow = AdrWorkflow::new(
        provider,
        project_dir,
        config,
        store,
        WorkflowOptions {
            flags: options.flags(),
            step_timeout: options.step_timeout_secs.map(Duration::from_secs),
        },
    );

    let rt = Runtime::new()?;
    let state = match &options.resume {
        Some(run_id) => rt.block_on(workflow.resume(&RunId::new(run_id.as_str())))?,
        None => rt.block_on(workflow.run())?,
    };

    report(&output, &state, &options)
}

/// Provider settings with the `--provider` / `--model` overrides applied.
fn resolve_settings(
    project_llm: &crate::config::LlmConfig,
    options: &GenerateOptions,
) -> Result<ProviderSettings> {
    let mut settings = ConfigLoader::load_provider_settings(project_llm)?;
    if let Some(provider) = &options.provider {
        settings.llm_provider = provider.clone();
    }
    if let Some(model) = &options.model {
        settings.set_model(model.as_str());
    }
    settings.validate()?;
    Ok(settings)
}

fn open_store(project_dir: &Path, in_memory: bool) -> Result<SharedCheckpointStore> {
    if in_memory {
        return Ok(Arc::new(MemoryCheckpointStore::new()));
    }
    let path = ConfigLoader::state_dir(project_dir).join(paths::CHECKPOINT_DB);
    Ok(Arc::new(SqliteCheckpointStore::open(&path)?))
}

fn report(output: &Output, state: &WorkflowState, options: &GenerateOptions) -> Result<()> {
    let missing = state.missing_sources();
    if !missing.is_empty() {
        let stages: Vec<&str> = missing.iter().map(|s| s.as_str()).collect();
        output.warning(&format!(
            "Source code missing for: {} (infrastructure analysis used instead)",
            stages.join(", ")
        ));
    }

    if state.adr_files.is_empty() {
        output.warning("The model returned no decision records; nothing written");
        output.field("Run", &state.run_id);
        return Ok(());
    }

    let output_dir = options.output_dir();
    let written = write_outputs(
        &output_dir,
        &state.project_name,
        &state.adr_files,
        &state.adr_records,
        options.json,
    )?;

    output.success(&format!(
        "Generated {} ADR(s) in {}",
        state.adr_records.len(),
        output_dir.display()
    ));
    for path in &written {
        output.field("Wrote", path.display());
    }
    output.field("Run", &state.run_id);
    Ok(())
}

fn enabled(on: bool) -> &'static str {
    if on { "enabled" } else { "disabled" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_follow_switches() {
        let options = GenerateOptions {
            no_terraform: true,
            regenerate_context: true,
            ..GenerateOptions::default()
        };
        assert_eq!(
            options.flags(),
            WorkflowFlags {
                include_terraform: false,
                reuse_context: false,
                include_knowledge: true,
            }
        );
        assert_eq!(GenerateOptions::default().flags(), WorkflowFlags::default());
    }

    #[test]
    fn test_output_dir_defaults_under_project() {
        let options = GenerateOptions {
            project_dir: PathBuf::from("/work/shop"),
            ..GenerateOptions::default()
        };
        assert_eq!(options.output_dir(), PathBuf::from("/work/shop/output-adrs"));

        let explicit = GenerateOptions {
            output: Some(PathBuf::from("/tmp/out")),
            ..options
        };
        assert_eq!(explicit.output_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_missing_project_dir_is_configuration_error() {
        let options = GenerateOptions {
            project_dir: PathBuf::from("/definitely/not/here"),
            ..GenerateOptions::default()
        };
        assert!(matches!(run(options), Err(AdrError::Configuration(_))));
    }

    #[test]
    fn test_no_checkpoint_uses_memory_store() {
        let temp = tempfile::TempDir::new().unwrap();
        open_store(temp.path(), true).unwrap();
        assert!(!ConfigLoader::state_dir(temp.path()).exists());

        open_store(temp.path(), false).unwrap();
        assert!(
            ConfigLoader::state_dir(temp.path())
                .join(paths::CHECKPOINT_DB)
                .exists()
        );
    }
}
