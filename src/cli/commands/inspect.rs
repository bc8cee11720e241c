//! Inspect Command
//!
//! Read run checkpoints of a project.
//!
//! Usage:
//!   adrsynth inspect <PROJECT_DIR> [-f json]
//!   adrsynth inspect <PROJECT_DIR> <RUN_ID> [-f json]

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::Format;
use crate::config::ConfigLoader;
use crate::constants::paths;
use crate::types::{AdrError, Result, RunId, Stage};
use crate::workflow::{Checkpoint, CheckpointStore, RunSummary, SqliteCheckpointStore, WorkflowStep};

/// Latest checkpoint of a run, as shown to the user.
#[derive(Debug, Serialize)]
pub struct RunDetails {
    pub run_id: RunId,
    pub project_name: String,
    pub last_step: WorkflowStep,
    pub checkpointed_at: String,
    pub finished: bool,
    pub completed_steps: Vec<WorkflowStep>,
    pub produced_fields: Vec<String>,
    pub missing_sources: Vec<Stage>,
    pub records: Vec<String>,
}

impl From<Checkpoint> for RunDetails {
    fn from(checkpoint: Checkpoint) -> Self {
        let state = checkpoint.state;
        Self {
            produced_fields: state.produced_fields(),
            missing_sources: state.missing_sources().into_iter().collect(),
            finished: state.is_finished(),
            records: state.adr_records.iter().map(|r| r.title.clone()).collect(),
            run_id: checkpoint.run_id,
            project_name: state.project_name,
            last_step: checkpoint.step,
            checkpointed_at: checkpoint.created_at,
            completed_steps: state.completed_steps,
        }
    }
}

pub fn run(project_dir: &Path, run_id: Option<&str>, format: Format) -> Result<()> {
    let db_path = checkpoint_db(project_dir);
    if !db_path.exists() {
        match format {
            Format::Json => println!("[]"),
            _ => println!("No runs recorded in {}", project_dir.display()),
        }
        return Ok(());
    }
    let store = SqliteCheckpointStore::open(&db_path)?;

    match run_id {
        None => print_runs(&store.list_runs()?, format),
        Some(id) => {
            let run_id = RunId::new(id);
            let checkpoint = store
                .latest(&run_id)?
                .ok_or_else(|| AdrError::Configuration(format!("Unknown run: {}", run_id)))?;
            print_details(&RunDetails::from(checkpoint), format)
        }
    }
}

fn checkpoint_db(project_dir: &Path) -> PathBuf {
    ConfigLoader::state_dir(project_dir).join(paths::CHECKPOINT_DB)
}

fn print_runs(runs: &[RunSummary], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(runs)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(runs)?),
        Format::Text => {
            if runs.is_empty() {
                println!("No runs recorded.");
                return Ok(());
            }
            println!("Runs");
            println!("══════════════════════════════════════");
            for run in runs {
                println!(
                    "{}  {:<24} {}/{} steps  {}  {}",
                    run.run_id,
                    run.last_step,
                    run.steps_completed,
                    WorkflowStep::ALL.len(),
                    if run.finished { "finished" } else { "incomplete" },
                    run.updated_at
                );
            }
        }
    }
    Ok(())
}

fn print_details(details: &RunDetails, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(details)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(details)?),
        Format::Text => {
            println!("Run {}", details.run_id);
            println!("══════════════════════════════════════");
            println!("Project:      {}", details.project_name);
            println!("Last step:    {}", details.last_step);
            println!("Saved at:     {}", details.checkpointed_at);
            println!(
                "Status:       {}",
                if details.finished { "finished" } else { "incomplete" }
            );

            let steps: Vec<&str> = details.completed_steps.iter().map(|s| s.name()).collect();
            println!("\nCompleted steps:\n  {}", steps.join("\n  "));
            println!("\nProduced fields:\n  {}", details.produced_fields.join("\n  "));

            if !details.missing_sources.is_empty() {
                let stages: Vec<&str> = details.missing_sources.iter().map(|s| s.as_str()).collect();
                println!("\nMissing sources: {}", stages.join(", "));
            }
            if !details.records.is_empty() {
                println!("\nRecords:");
                for (i, title) in details.records.iter().enumerate() {
                    println!("  {}. {}", i + 1, title);
                }
            }
        }
    }
    Ok(())
}
