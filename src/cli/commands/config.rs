//! Config Command
//!
//! Show or create a project's `project-config.yaml`.
//!
//! Usage:
//!   adrsynth config show <PROJECT_DIR> [-f json]
//!   adrsynth config init <PROJECT_DIR> [--force]
//!   adrsynth config init --global [--force]

use serde::Serialize;
use std::path::Path;

use crate::cli::{Format, Output};
use crate::config::{ConfigLoader, ProjectConfig};
use crate::types::Result;

/// Project config plus the provider it resolves to.
#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    #[serde(flatten)]
    project: &'a ProjectConfig,
    resolved_provider: String,
    resolved_model: String,
    global_config: Option<String>,
}

/// Show the effective configuration.
pub fn show(project_dir: &Path, format: Format) -> Result<()> {
    let project = ConfigLoader::load_project(project_dir)?;
    let settings = ConfigLoader::load_provider_settings(&project.llm)?;
    let effective = EffectiveConfig {
        project: &project,
        resolved_provider: settings.llm_provider.clone(),
        resolved_model: settings.model().to_string(),
        global_config: ConfigLoader::global_config_path()
            .filter(|p| p.exists())
            .map(|p| p.display().to_string()),
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&effective)?),
        Format::Yaml | Format::Text => {
            let config_path = ConfigLoader::project_config_path(project_dir);
            if config_path.exists() {
                println!("# Project Config: {}\n", config_path.display());
            } else {
                println!("# No project config found; showing defaults\n");
            }
            print!("{}", serde_yaml::to_string(&effective)?);
        }
    }
    Ok(())
}

/// Write the default project configuration.
pub fn init(project_dir: &Path, force: bool) -> Result<()> {
    let path = ConfigLoader::init_project(project_dir, force)?;
    let output = Output::new();
    output.success("Initialized project configuration");
    output.field("Config", path.display());
    Ok(())
}

/// Write the global provider-settings template.
pub fn init_global(force: bool) -> Result<()> {
    let path = ConfigLoader::init_global(force)?;
    let output = Output::new();
    output.success("Initialized global configuration");
    output.field("Config", path.display());
    output.info("API keys are read from the environment (OPENAI_API_KEY, GROQ_API_KEY, GOOGLE_API_KEY)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_refuse_overwrite() {
        let temp = TempDir::new().unwrap();
        init(temp.path(), false).unwrap();
        assert!(ConfigLoader::project_config_path(temp.path()).exists());

        assert!(init(temp.path(), false).is_err());
        assert!(init(temp.path(), true).is_ok());
    }

    #[test]
    fn test_effective_config_flattens_project_fields() {
        let temp = TempDir::new().unwrap();
        let project = ProjectConfig::synthesized_for(temp.path());
        let effective = EffectiveConfig {
            project: &project,
            resolved_provider: "groq".into(),
            resolved_model: "llama".into(),
            global_config: None,
        };
        let value = serde_json::to_value(&effective).unwrap();
        assert_eq!(value["project_name"], project.project_name.as_str());
        assert_eq!(value["resolved_provider"], "groq");
        assert!(value["context_generation"]["max_files"].is_number());
    }
}
