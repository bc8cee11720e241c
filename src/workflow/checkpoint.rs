//! Run Checkpoints
//!
//! The full workflow state is saved after every merged step, keyed by run id.
//! The SQLite store keeps the history of a run; the latest row is what a
//! resume starts from.

use chrono::Utc;
use dashmap::DashMap;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::state::WorkflowState;
use super::step::WorkflowStep;
use crate::types::{AdrError, Result, ResultExt, RunId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    pub run_id: RunId,
    pub step: WorkflowStep,
    /// Number of steps completed when this checkpoint was written
    pub step_index: usize,
    pub state: WorkflowState,
    pub created_at: String,
}

impl Checkpoint {
    pub fn new(step: WorkflowStep, state: &WorkflowState) -> Self {
        Self {
            run_id: state.run_id.clone(),
            step,
            step_index: state.completed_steps.len(),
            state: state.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id.clone(),
            project_name: self.state.project_name.clone(),
            last_step: self.step,
            steps_completed: self.step_index,
            finished: self.state.is_finished(),
            updated_at: self.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub project_name: String,
    pub last_step: WorkflowStep,
    pub steps_completed: usize,
    pub finished: bool,
    pub updated_at: String,
}

pub trait CheckpointStore: Send + Sync {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Most recent checkpoint of a run.
    fn latest(&self, run_id: &RunId) -> Result<Option<Checkpoint>>;

    /// Latest checkpoint of every run, newest first.
    fn list_runs(&self) -> Result<Vec<RunSummary>>;
}

pub type SharedCheckpointStore = Arc<dyn CheckpointStore>;

// =============================================================================
// SQLite
// =============================================================================

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS workflow_checkpoints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    step TEXT NOT NULL,
    step_index INTEGER NOT NULL,
    state_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_checkpoints_run ON workflow_checkpoints(run_id, id);
"#;

type CheckpointRow = (String, String, i64, String, String);

pub struct SqliteCheckpointStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteCheckpointStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path).with_init(Self::configure_connection);
        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(Duration::from_secs(30))
            .build(manager)
            .map_err(|e| AdrError::Storage(format!("Failed to create connection pool: {}", e)))?;

        let store = Self { pool };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .map_err(|e| AdrError::Storage(format!("Failed to create in-memory pool: {}", e)))?;

        let store = Self { pool };
        store.initialize()?;
        Ok(store)
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            "#,
        )
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            AdrError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    fn initialize(&self) -> Result<()> {
        self.conn()?
            .execute_batch(SCHEMA)
            .with_context("Failed to initialize checkpoint schema")
    }

    fn from_row(row: CheckpointRow) -> Result<Checkpoint> {
        let (run_id, step, step_index, state_json, created_at) = row;
        let step = WorkflowStep::from_name(&step)
            .ok_or_else(|| AdrError::Storage(format!("Unknown step '{}' in checkpoint", step)))?;
        Ok(Checkpoint {
            run_id: RunId::new(run_id),
            step,
            step_index: step_index.max(0) as usize,
            state: serde_json::from_str(&state_json)?,
            created_at,
        })
    }
}

impl CheckpointStore for SqliteCheckpointStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let state_json = serde_json::to_string(&checkpoint.state)?;
        self.conn()?
            .execute(
                "INSERT INTO workflow_checkpoints (run_id, step, step_index, state_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    checkpoint.run_id.as_str(),
                    checkpoint.step.name(),
                    checkpoint.step_index as i64,
                    state_json,
                    checkpoint.created_at,
                ],
            )
            .with_context("Failed to save checkpoint")?;

        tracing::debug!(
            "Checkpoint saved: run={}, step={}",
            checkpoint.run_id,
            checkpoint.step
        );
        Ok(())
    }

    fn latest(&self, run_id: &RunId) -> Result<Option<Checkpoint>> {
        let row: Option<CheckpointRow> = self
            .conn()?
            .query_row(
                "SELECT run_id, step, step_index, state_json, created_at
                 FROM workflow_checkpoints WHERE run_id = ?1
                 ORDER BY id DESC LIMIT 1",
                params![run_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()
            .with_context("Failed to load checkpoint")?;

        row.map(Self::from_row).transpose()
    }

    fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT run_id, step, step_index, state_json, created_at
                 FROM workflow_checkpoints c
                 WHERE id = (SELECT MAX(id) FROM workflow_checkpoints WHERE run_id = c.run_id)
                 ORDER BY id DESC",
            )
            .with_context("Failed to prepare run listing")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .with_context("Failed to list runs")?;

        let mut runs = Vec::new();
        for row in rows {
            let row: CheckpointRow = row?;
            runs.push(Self::from_row(row)?.summary());
        }
        Ok(runs)
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Process-local store, used for `--no-checkpoint` runs and in tests.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    runs: DashMap<RunId, Vec<Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of checkpoints written for a run.
    pub fn count(&self, run_id: &RunId) -> usize {
        self.runs.get(run_id).map(|c| c.len()).unwrap_or(0)
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.runs
            .entry(checkpoint.run_id.clone())
            .or_default()
            .push(checkpoint.clone());
        Ok(())
    }

    fn latest(&self, run_id: &RunId) -> Result<Option<Checkpoint>> {
        Ok(self.runs.get(run_id).and_then(|c| c.last().cloned()))
    }

    fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let mut runs: Vec<RunSummary> = self
            .runs
            .iter()
            .filter_map(|entry| entry.value().last().map(Checkpoint::summary))
            .collect();
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::workflow::state::{StateUpdate, WorkflowFlags};
    use tempfile::TempDir;

    fn state(run: &str) -> WorkflowState {
        WorkflowState::new(
            RunId::from(run),
            Path::new("/projects/shop"),
            &ProjectConfig::default(),
            WorkflowFlags::default(),
        )
    }

    fn exercise(store: &dyn CheckpointStore) {
        let mut s = state("run-a");
        assert!(store.latest(&s.run_id).unwrap().is_none());

        s.apply(
            WorkflowStep::CreateContext,
            StateUpdate::Context {
                architectural_context: "ctx".into(),
                knowledge: String::new(),
                minor_structure: "tree-minor".into(),
                major_structure: "tree-major".into(),
            },
        );
        store
            .save(&Checkpoint::new(WorkflowStep::CreateContext, &s))
            .unwrap();

        s.apply(
            WorkflowStep::AnalyzeTerraformMinor,
            StateUpdate::Terraform {
                stage: crate::types::Stage::Minor,
                analysis: crate::agents::ClassificationResult {
                    microservices: false,
                    confidence: 0.6,
                    signals_for: vec![],
                    signals_against: vec!["[C1] single unit".into()],
                },
            },
        );
        store
            .save(&Checkpoint::new(WorkflowStep::AnalyzeTerraformMinor, &s))
            .unwrap();
        store
            .save(&Checkpoint::new(WorkflowStep::CreateContext, &state("run-b")))
            .unwrap();

        let latest = store.latest(&RunId::from("run-a")).unwrap().unwrap();
        assert_eq!(latest.step, WorkflowStep::AnalyzeTerraformMinor);
        assert_eq!(latest.step_index, 2);
        assert_eq!(latest.state, s);

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 2);
        let run_a = runs.iter().find(|r| r.run_id.as_str() == "run-a").unwrap();
        assert_eq!(run_a.steps_completed, 2);
        assert!(!run_a.finished);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCheckpointStore::new();
        exercise(&store);
        assert_eq!(store.count(&RunId::from("run-a")), 2);
    }

    #[test]
    fn test_sqlite_in_memory_store() {
        exercise(&SqliteCheckpointStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_file_store_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".adrsynth/checkpoints.db");
        {
            let store = SqliteCheckpointStore::open(&path).unwrap();
            store
                .save(&Checkpoint::new(WorkflowStep::CreateContext, &state("run-x")))
                .unwrap();
        }
        let reopened = SqliteCheckpointStore::open(&path).unwrap();
        let latest = reopened.latest(&RunId::from("run-x")).unwrap().unwrap();
        assert_eq!(latest.step, WorkflowStep::CreateContext);
    }
}
