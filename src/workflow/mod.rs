//! Workflow Engine
//!
//! Runs the fixed step graph for one project. Steps are futures polled
//! concurrently on the caller's task: a step starts once all of its
//! dependencies have been merged, receives a snapshot of the state taken at
//! that moment, and returns a [`StateUpdate`]. The first failing step aborts
//! the run and drops every step still in flight.

mod checkpoint;
mod state;
mod step;

pub use checkpoint::{
    Checkpoint, CheckpointStore, MemoryCheckpointStore, RunSummary, SharedCheckpointStore,
    SqliteCheckpointStore,
};
pub use state::{StageState, StateUpdate, WorkflowFlags, WorkflowState};
pub use step::WorkflowStep;

use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::agents::{
    CodeAnalyzer, CodeInputs, Comparator, ContextGenerator, ContextMode, InfraAnalyzer,
    InfraInputs, RecordGenerator,
};
use crate::ai::{SharedProvider, with_optional_timeout};
use crate::config::ProjectConfig;
use crate::extractor::{
    CodeSummarizer, ExtractionMetadata, ExtractionOptions, SourceArchive, SourceExtractor,
    format_report,
};
use crate::types::{AdrError, Result, RunId, Stage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub flags: WorkflowFlags,
    /// Deadline for each step; none by default
    pub step_timeout: Option<Duration>,
}

pub struct AdrWorkflow {
    provider: SharedProvider,
    project_dir: PathBuf,
    config: ProjectConfig,
    store: SharedCheckpointStore,
    options: WorkflowOptions,
}

impl AdrWorkflow {
    pub fn new(
        provider: SharedProvider,
        project_dir: &Path,
        config: ProjectConfig,
        store: SharedCheckpointStore,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            provider,
            project_dir: project_dir.to_path_buf(),
            config,
            store,
            options,
        }
    }

    pub fn initial_state(&self, run_id: RunId) -> WorkflowState {
        WorkflowState::new(run_id, &self.project_dir, &self.config, self.options.flags)
    }

    /// Start a new run.
    pub async fn run(&self) -> Result<WorkflowState> {
        let state = self.initial_state(RunId::generate());
        self.execute(state).await
    }

    /// Continue a run from its latest checkpoint; completed steps are skipped.
    pub async fn resume(&self, run_id: &RunId) -> Result<WorkflowState> {
        let checkpoint = self.store.latest(run_id)?.ok_or_else(|| {
            AdrError::Configuration(format!("No checkpoint found for run {}", run_id))
        })?;
        info!(
            run_id = %run_id,
            last_step = %checkpoint.step,
            "Resuming run"
        );
        self.execute(checkpoint.state).await
    }

    /// Check the inputs that must exist before any model call.
    pub fn preflight(&self, state: &WorkflowState) -> Result<()> {
        if state.flags.include_terraform {
            for stage in Stage::ALL {
                let path = state.terraform_path(stage);
                if !path.is_file() {
                    return Err(AdrError::Configuration(format!(
                        "Terraform file for the {} stage not found: {}",
                        stage,
                        path.display()
                    )));
                }
            }
        }
        for stage in Stage::ALL {
            if let Some(path) = present_archive(state, stage) {
                SourceArchive::open(path)?;
            }
        }
        Ok(())
    }

    /// Drive `state` to the terminal step.
    pub async fn execute(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        if state.is_finished() {
            info!(run_id = %state.run_id, "Run already finished");
            return Ok(state);
        }
        self.preflight(&state)?;

        let include_terraform = state.flags.include_terraform;
        let mut pending: Vec<WorkflowStep> = WorkflowStep::plan(include_terraform)
            .into_iter()
            .filter(|s| !state.is_completed(*s))
            .collect();
        let mut running = FuturesUnordered::new();

        info!(
            run_id = %state.run_id,
            project = %state.project_name,
            steps = pending.len(),
            "Starting workflow"
        );

        loop {
            let ready: Vec<WorkflowStep> = pending
                .iter()
                .copied()
                .filter(|s| {
                    s.dependencies(include_terraform)
                        .iter()
                        .all(|d| state.is_completed(*d))
                })
                .collect();

            if !ready.is_empty() {
                pending.retain(|s| !ready.contains(s));
                let snapshot = Arc::new(state.clone());
                for step in ready {
                    info!(run_id = %state.run_id, step = %step, "Step started");
                    let snapshot = Arc::clone(&snapshot);
                    running.push(async move {
                        let started = Instant::now();
                        let result = with_optional_timeout(
                            self.options.step_timeout,
                            self.run_step(step, snapshot),
                            step.name(),
                        )
                        .await;
                        (step, result, started.elapsed())
                    });
                }
            }

            let Some((step, result, elapsed)) = running.next().await else {
                break;
            };
            let update = result.map_err(|e| e.in_step(step.name()))?;
            let was_source_step = matches!(update, StateUpdate::SourceCode { .. });
            state.apply(step, update);
            self.store.save(&Checkpoint::new(step, &state))?;

            info!(
                run_id = %state.run_id,
                step = %step,
                elapsed_ms = elapsed.as_millis() as u64,
                "Step completed"
            );
            if was_source_step && state.missing_sources().len() == Stage::ALL.len() {
                warn!("Source code is missing for both stages; analyses rely on infrastructure only");
            }
        }

        if !pending.is_empty() {
            let names: Vec<&str> = pending.iter().map(|s| s.name()).collect();
            return Err(AdrError::Configuration(format!(
                "Steps could not be scheduled: {}",
                names.join(", ")
            )));
        }

        info!(
            run_id = %state.run_id,
            records = state.adr_records.len(),
            "Workflow finished"
        );
        Ok(state)
    }

    async fn run_step(&self, step: WorkflowStep, state: Arc<WorkflowState>) -> Result<StateUpdate> {
        match step {
            WorkflowStep::CreateContext => self.create_context(&state).await,
            WorkflowStep::AnalyzeTerraformMinor => self.analyze_terraform(&state, Stage::Minor).await,
            WorkflowStep::AnalyzeTerraformMajor => self.analyze_terraform(&state, Stage::Major).await,
            WorkflowStep::AnalyzeSourceCodeMinor => {
                self.analyze_source_code(&state, Stage::Minor).await
            }
            WorkflowStep::AnalyzeSourceCodeMajor => {
                self.analyze_source_code(&state, Stage::Major).await
            }
            WorkflowStep::DoArchitectureDiff => self.compare(&state).await,
            WorkflowStep::GenerateAdrs => self.generate_records(&state).await,
        }
    }

    async fn create_context(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let mode = ContextMode::from_flags(state.flags.include_knowledge, state.flags.reuse_context);
        let architectural_context = ContextGenerator::new(self.provider.clone())
            .generate(mode)
            .await?;

        let knowledge = match tokio::fs::read_to_string(&state.knowledge_base).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Knowledge base {} not readable ({}); continuing without it",
                    state.knowledge_base.display(),
                    e
                );
                String::new()
            }
        };

        let structure = |stage: Stage| -> Result<String> {
            match present_archive(state, stage) {
                Some(path) => Ok(format_report(&SourceArchive::open(path)?.classify())),
                None => Ok(String::new()),
            }
        };

        Ok(StateUpdate::Context {
            architectural_context,
            knowledge,
            minor_structure: structure(Stage::Minor)?,
            major_structure: structure(Stage::Major)?,
        })
    }

    async fn analyze_terraform(&self, state: &WorkflowState, stage: Stage) -> Result<StateUpdate> {
        let path = state.terraform_path(stage);
        let terraform = tokio::fs::read_to_string(path).await.map_err(|e| {
            AdrError::Configuration(format!(
                "Cannot read Terraform file {}: {}",
                path.display(),
                e
            ))
        })?;

        let stage_state = state.stage(stage);
        let inputs = InfraInputs {
            terraform: &terraform,
            context: state.architectural_context.as_deref().unwrap_or_default(),
            structure: stage_state.project_structure.as_deref().unwrap_or_default(),
            knowledge: state.knowledge.as_deref().unwrap_or_default(),
        };
        let analysis = InfraAnalyzer::new(self.provider.clone())
            .analyze(inputs, stage)
            .await?;
        Ok(StateUpdate::Terraform { stage, analysis })
    }

    async fn analyze_source_code(&self, state: &WorkflowState, stage: Stage) -> Result<StateUpdate> {
        let stage_state = state.stage(stage);
        let prior_analysis = stage_state
            .terraform_analysis
            .as_ref()
            .map(|a| a.to_markdown())
            .unwrap_or_default();

        let Some(path) = present_archive(state, stage) else {
            warn!(
                "Source code for the {} stage not available; using the infrastructure analysis only",
                stage
            );
            return Ok(StateUpdate::SourceCode {
                stage,
                source_code: String::new(),
                source_code_dict: Default::default(),
                metadata: ExtractionMetadata::missing(stage),
                improved_analysis: prior_analysis,
                missing: true,
            });
        };

        let options = ExtractionOptions::from(&self.config.context_generation);
        let mut extractor = SourceExtractor::new(options);
        if options.summarize {
            extractor = extractor.with_summarizer(CodeSummarizer::new(self.provider.clone()));
        }
        let mut archive = SourceArchive::open(path)?;
        let extracted = extractor.extract(&mut archive).await?;
        let source_code = extracted.concatenated();
        let metadata = extracted.metadata(stage);
        debug!(
            stage = %stage,
            files = metadata.total_files,
            summarized = metadata.summarized_files,
            "Source extracted"
        );

        let inputs = CodeInputs {
            context: state.architectural_context.as_deref().unwrap_or_default(),
            prior_analysis: &prior_analysis,
            source: &source_code,
            structure: stage_state.project_structure.as_deref().unwrap_or_default(),
        };
        let improved_analysis = CodeAnalyzer::new(self.provider.clone())
            .analyze(inputs, stage)
            .await?;

        Ok(StateUpdate::SourceCode {
            stage,
            source_code_dict: extracted.to_map(),
            source_code,
            metadata,
            improved_analysis,
            missing: false,
        })
    }

    async fn compare(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let analysis = |stage: Stage| {
            state.stage(stage).improved_analysis.as_deref().ok_or_else(|| {
                AdrError::Configuration(format!("improved analysis for {} is missing", stage))
            })
        };
        let architecture_diff = Comparator::new(self.provider.clone())
            .compare(
                analysis(Stage::Minor)?,
                analysis(Stage::Major)?,
                state.architectural_context.as_deref().unwrap_or_default(),
            )
            .await?;
        Ok(StateUpdate::Diff { architecture_diff })
    }

    async fn generate_records(&self, state: &WorkflowState) -> Result<StateUpdate> {
        let comparison = state.architecture_diff.as_deref().ok_or_else(|| {
            AdrError::Configuration("architecture comparison is missing".to_string())
        })?;
        let generated = RecordGenerator::new(self.provider.clone())
            .generate(
                comparison,
                state.architectural_context.as_deref().unwrap_or_default(),
                &state.project_name,
            )
            .await?;
        Ok(StateUpdate::Records {
            records: generated.records,
            files: generated.files,
        })
    }
}

/// Configured archive for `stage` if it exists on disk.
fn present_archive(state: &WorkflowState, stage: Stage) -> Option<&Path> {
    state.source_archive(stage).filter(|p| p.is_file())
}
