//! Workflow state and the typed updates steps return.
//!
//! Every field has exactly one writer step. Minor and major steps write
//! disjoint [`StageState`]s, so applying concurrent updates in any order
//! yields the same state.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::step::WorkflowStep;
use crate::adr::DecisionRecord;
use crate::agents::ClassificationResult;
use crate::config::{ProjectConfig, resolve_path};
use crate::extractor::ExtractionMetadata;
use crate::types::{RunId, Stage};

/// Switches chosen for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFlags {
    pub include_terraform: bool,
    /// Use the built-in theoretical context instead of generating one
    pub reuse_context: bool,
    pub include_knowledge: bool,
}

impl Default for WorkflowFlags {
    fn default() -> Self {
        Self {
            include_terraform: true,
            reuse_context: true,
            include_knowledge: true,
        }
    }
}

/// Fields produced for one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    pub project_structure: Option<String>,
    pub terraform_analysis: Option<ClassificationResult>,
    pub source_code: Option<String>,
    #[serde(default)]
    pub source_code_dict: BTreeMap<String, String>,
    pub extraction_metadata: Option<ExtractionMetadata>,
    pub improved_analysis: Option<String>,
    /// Archive absent; set by this stage's source-code step
    #[serde(default)]
    pub source_missing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub run_id: RunId,
    pub project_name: String,
    /// RFC 3339 creation time
    pub timestamp: String,
    pub terraform_minor: PathBuf,
    pub terraform_major: PathBuf,
    pub source_code_zip_minor: Option<PathBuf>,
    pub source_code_zip_major: Option<PathBuf>,
    pub knowledge_base: PathBuf,
    pub flags: WorkflowFlags,

    pub architectural_context: Option<String>,
    /// Knowledge document text, empty when disabled or missing
    pub knowledge: Option<String>,
    pub minor: StageState,
    pub major: StageState,
    pub architecture_diff: Option<String>,
    #[serde(default)]
    pub adr_records: Vec<DecisionRecord>,
    #[serde(default)]
    pub adr_files: BTreeMap<String, String>,

    #[serde(default)]
    pub completed_steps: Vec<WorkflowStep>,
}

/// Output of one step, merged by [`WorkflowState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Context {
        architectural_context: String,
        knowledge: String,
        minor_structure: String,
        major_structure: String,
    },
    Terraform {
        stage: Stage,
        analysis: ClassificationResult,
    },
    SourceCode {
        stage: Stage,
        source_code: String,
        source_code_dict: BTreeMap<String, String>,
        metadata: ExtractionMetadata,
        improved_analysis: String,
        missing: bool,
    },
    Diff {
        architecture_diff: String,
    },
    Records {
        records: Vec<DecisionRecord>,
        files: BTreeMap<String, String>,
    },
}

impl WorkflowState {
    pub fn new(run_id: RunId, project_dir: &Path, config: &ProjectConfig, flags: WorkflowFlags) -> Self {
        let archive = |stage: Stage| {
            config
                .source_archive(stage)
                .map(|p| resolve_path(project_dir, p))
        };
        Self {
            run_id,
            project_name: config.project_name.clone(),
            timestamp: Utc::now().to_rfc3339(),
            terraform_minor: resolve_path(project_dir, &config.terraform_minor),
            terraform_major: resolve_path(project_dir, &config.terraform_major),
            source_code_zip_minor: archive(Stage::Minor),
            source_code_zip_major: archive(Stage::Major),
            knowledge_base: resolve_knowledge_path(project_dir, &config.knowledge_base),
            flags,
            architectural_context: None,
            knowledge: None,
            minor: StageState::default(),
            major: StageState::default(),
            architecture_diff: None,
            adr_records: Vec::new(),
            adr_files: BTreeMap::new(),
            completed_steps: Vec::new(),
        }
    }

    pub fn stage(&self, stage: Stage) -> &StageState {
        match stage {
            Stage::Minor => &self.minor,
            Stage::Major => &self.major,
        }
    }

    fn stage_mut(&mut self, stage: Stage) -> &mut StageState {
        match stage {
            Stage::Minor => &mut self.minor,
            Stage::Major => &mut self.major,
        }
    }

    pub fn terraform_path(&self, stage: Stage) -> &Path {
        match stage {
            Stage::Minor => &self.terraform_minor,
            Stage::Major => &self.terraform_major,
        }
    }

    pub fn source_archive(&self, stage: Stage) -> Option<&Path> {
        match stage {
            Stage::Minor => self.source_code_zip_minor.as_deref(),
            Stage::Major => self.source_code_zip_major.as_deref(),
        }
    }

    /// Stages whose source archive was absent.
    pub fn missing_sources(&self) -> BTreeSet<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| self.stage(*s).source_missing)
            .collect()
    }

    pub fn is_completed(&self, step: WorkflowStep) -> bool {
        self.completed_steps.contains(&step)
    }

    pub fn is_finished(&self) -> bool {
        self.is_completed(WorkflowStep::TERMINAL)
    }

    /// Merge a step's output and record the step as completed.
    pub fn apply(&mut self, step: WorkflowStep, update: StateUpdate) {
        match update {
            StateUpdate::Context {
                architectural_context,
                knowledge,
                minor_structure,
                major_structure,
            } => {
                self.architectural_context = Some(architectural_context);
                self.knowledge = Some(knowledge);
                self.minor.project_structure = Some(minor_structure);
                self.major.project_structure = Some(major_structure);
            }
            StateUpdate::Terraform { stage, analysis } => {
                self.stage_mut(stage).terraform_analysis = Some(analysis);
            }
            StateUpdate::SourceCode {
                stage,
                source_code,
                source_code_dict,
                metadata,
                improved_analysis,
                missing,
            } => {
                let target = self.stage_mut(stage);
                target.source_code = Some(source_code);
                target.source_code_dict = source_code_dict;
                target.extraction_metadata = Some(metadata);
                target.improved_analysis = Some(improved_analysis);
                target.source_missing = missing;
            }
            StateUpdate::Diff { architecture_diff } => {
                self.architecture_diff = Some(architecture_diff);
            }
            StateUpdate::Records { records, files } => {
                self.adr_records = records;
                self.adr_files = files;
            }
        }
        if !self.completed_steps.contains(&step) {
            self.completed_steps.push(step);
        }
    }

    /// Names of the derived fields produced so far.
    pub fn produced_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.architectural_context.is_some() {
            fields.push("architectural_context".to_string());
        }
        for stage in Stage::ALL {
            let s = self.stage(stage);
            let present = [
                ("project_structure", s.project_structure.is_some()),
                ("terraform_analysis", s.terraform_analysis.is_some()),
                ("source_code", s.source_code.is_some()),
                ("extraction_metadata", s.extraction_metadata.is_some()),
                ("improved_analysis", s.improved_analysis.is_some()),
            ];
            fields.extend(
                present
                    .into_iter()
                    .filter(|(_, p)| *p)
                    .map(|(name, _)| format!("{}_{}", name, stage)),
            );
        }
        if self.architecture_diff.is_some() {
            fields.push("architecture_diff".to_string());
        }
        if !self.adr_files.is_empty() {
            fields.push("adr_records".to_string());
            fields.push("adr_files".to_string());
        }
        fields
    }
}

/// Knowledge document path: under the project directory when it exists
/// there, otherwise as given.
fn resolve_knowledge_path(project_dir: &Path, configured: &str) -> PathBuf {
    let candidate = resolve_path(project_dir, configured);
    if candidate.exists() {
        candidate
    } else {
        PathBuf::from(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractionMetadata;
    use tempfile::TempDir;

    fn state() -> WorkflowState {
        let config = ProjectConfig {
            project_name: "shop".into(),
            source_code_zip_minor: Some("minor.zip".into()),
            ..ProjectConfig::default()
        };
        WorkflowState::new(
            RunId::from("run-1"),
            Path::new("/projects/shop"),
            &config,
            WorkflowFlags::default(),
        )
    }

    fn source_update(stage: Stage, missing: bool) -> StateUpdate {
        StateUpdate::SourceCode {
            stage,
            source_code: String::new(),
            source_code_dict: BTreeMap::new(),
            metadata: ExtractionMetadata::missing(stage),
            improved_analysis: format!("{} analysis", stage),
            missing,
        }
    }

    #[test]
    fn test_paths_resolve_against_project_dir() {
        let s = state();
        assert_eq!(
            s.terraform_minor,
            PathBuf::from("/projects/shop/cloud_evolucion_menor.tf")
        );
        assert_eq!(
            s.source_archive(Stage::Minor),
            Some(Path::new("/projects/shop/minor.zip"))
        );
        assert_eq!(s.source_archive(Stage::Major), None);
        assert_eq!(s.knowledge_base, PathBuf::from("knowledge/IAC.txt"));
    }

    #[test]
    fn test_knowledge_prefers_project_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("knowledge")).unwrap();
        std::fs::write(temp.path().join("knowledge/IAC.txt"), "[R1]").unwrap();

        assert_eq!(
            resolve_knowledge_path(temp.path(), "knowledge/IAC.txt"),
            temp.path().join("knowledge/IAC.txt")
        );
    }

    #[test]
    fn test_stage_updates_commute() {
        let mut a = state();
        a.apply(WorkflowStep::AnalyzeSourceCodeMinor, source_update(Stage::Minor, true));
        a.apply(WorkflowStep::AnalyzeSourceCodeMajor, source_update(Stage::Major, false));

        let mut b = state();
        b.apply(WorkflowStep::AnalyzeSourceCodeMajor, source_update(Stage::Major, false));
        b.apply(WorkflowStep::AnalyzeSourceCodeMinor, source_update(Stage::Minor, true));

        assert_eq!(a.minor, b.minor);
        assert_eq!(a.major, b.major);
        assert_eq!(a.missing_sources(), BTreeSet::from([Stage::Minor]));
        assert_eq!(a.completed_steps.len(), 2);
    }

    #[test]
    fn test_produced_fields_and_serde() {
        let mut s = state();
        s.apply(
            WorkflowStep::DoArchitectureDiff,
            StateUpdate::Diff {
                architecture_diff: "diff".into(),
            },
        );
        assert_eq!(s.produced_fields(), vec!["architecture_diff"]);
        assert!(s.is_completed(WorkflowStep::DoArchitectureDiff));
        assert!(!s.is_finished());

        let json = serde_json::to_string(&s).unwrap();
        let restored: WorkflowState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, s);
    }
}
