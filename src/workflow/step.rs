//! Workflow steps and their dependency graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Steps in declaration order. Numbering follows a valid topological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    CreateContext = 1,
    AnalyzeTerraformMinor = 2,
    AnalyzeTerraformMajor = 3,
    AnalyzeSourceCodeMinor = 4,
    AnalyzeSourceCodeMajor = 5,
    DoArchitectureDiff = 6,
    GenerateAdrs = 7,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 7] = [
        Self::CreateContext,
        Self::AnalyzeTerraformMinor,
        Self::AnalyzeTerraformMajor,
        Self::AnalyzeSourceCodeMinor,
        Self::AnalyzeSourceCodeMajor,
        Self::DoArchitectureDiff,
        Self::GenerateAdrs,
    ];

    pub const TERMINAL: WorkflowStep = Self::GenerateAdrs;

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateContext => "create_context",
            Self::AnalyzeTerraformMinor => "analyze_terraform_minor",
            Self::AnalyzeTerraformMajor => "analyze_terraform_major",
            Self::AnalyzeSourceCodeMinor => "analyze_source_code_minor",
            Self::AnalyzeSourceCodeMajor => "analyze_source_code_major",
            Self::DoArchitectureDiff => "do_architecture_diff",
            Self::GenerateAdrs => "generate_adrs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Whether the step runs at all.
    pub fn is_scheduled(&self, include_terraform: bool) -> bool {
        include_terraform
            || !matches!(
                self,
                Self::AnalyzeTerraformMinor | Self::AnalyzeTerraformMajor
            )
    }

    /// Steps that must complete before this one starts.
    pub fn dependencies(&self, include_terraform: bool) -> Vec<WorkflowStep> {
        match self {
            Self::CreateContext => vec![],
            Self::AnalyzeTerraformMinor | Self::AnalyzeTerraformMajor => {
                vec![Self::CreateContext]
            }
            Self::AnalyzeSourceCodeMinor if include_terraform => {
                vec![Self::AnalyzeTerraformMinor]
            }
            Self::AnalyzeSourceCodeMajor if include_terraform => {
                vec![Self::AnalyzeTerraformMajor]
            }
            Self::AnalyzeSourceCodeMinor | Self::AnalyzeSourceCodeMajor => {
                vec![Self::CreateContext]
            }
            Self::DoArchitectureDiff => {
                vec![Self::AnalyzeSourceCodeMinor, Self::AnalyzeSourceCodeMajor]
            }
            Self::GenerateAdrs => vec![Self::DoArchitectureDiff],
        }
    }

    /// Scheduled steps for a run.
    pub fn plan(include_terraform: bool) -> Vec<WorkflowStep> {
        Self::ALL
            .into_iter()
            .filter(|s| s.is_scheduled(include_terraform))
            .collect()
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
