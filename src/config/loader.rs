//! Configuration Loader (Figment-based)
//!
//! Project config: defaults → `project-config.yaml`.
//! Provider settings: defaults → project `llm` section → global
//! `config.toml` → environment variables.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::{LlmConfig, ProjectConfig, ProviderSettings};
use crate::constants::{llm, paths};
use crate::types::{AdrError, Result};

pub struct ConfigLoader;

#[derive(Serialize)]
struct GlobalTemplate<'a> {
    llm_provider: &'a str,
    openai_model: &'a str,
    groq_model: &'a str,
    gemini_model: &'a str,
    temperature: f32,
    llm_timeout_secs: u64,
}

impl ConfigLoader {
    // =========================================================================
    // Project Config
    // =========================================================================

    /// Load `project-config.yaml` from `project_dir`, or synthesize the default
    /// configuration when the file does not exist.
    pub fn load_project(project_dir: &Path) -> Result<ProjectConfig> {
        let config_path = Self::project_config_path(project_dir);

        let config = if config_path.exists() {
            debug!("Loading project config from: {}", config_path.display());
            Figment::new()
                .merge(Serialized::defaults(ProjectConfig::base_for(project_dir)))
                .merge(Yaml::file(&config_path))
                .extract::<ProjectConfig>()
                .map_err(|e| AdrError::Configuration(format!("{}: {}", config_path.display(), e)))?
        } else {
            info!(
                "No {} in {}, using default configuration",
                paths::PROJECT_CONFIG_FILE,
                project_dir.display()
            );
            ProjectConfig::synthesized_for(project_dir)
        };

        config.validate()?;
        Ok(config)
    }

    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(paths::PROJECT_CONFIG_FILE)
    }

    /// Write the default configuration as YAML. Refuses to overwrite unless `force`.
    pub fn init_project(project_dir: &Path, force: bool) -> Result<PathBuf> {
        let config_path = Self::project_config_path(project_dir);
        if config_path.exists() && !force {
            return Err(AdrError::Configuration(format!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            )));
        }

        fs::create_dir_all(project_dir)?;
        let config = ProjectConfig::synthesized_for(project_dir);
        fs::write(&config_path, serde_yaml::to_string(&config)?)?;
        info!("Created project config: {}", config_path.display());
        Ok(config_path)
    }

    // =========================================================================
    // Provider Settings
    // =========================================================================

    /// Resolve provider settings using the user's global config file.
    pub fn load_provider_settings(project_llm: &LlmConfig) -> Result<ProviderSettings> {
        Self::load_provider_settings_from(project_llm, Self::global_config_path().as_deref())
    }

    pub fn load_provider_settings_from(
        project_llm: &LlmConfig,
        global_config: Option<&Path>,
    ) -> Result<ProviderSettings> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(ProviderSettings::default()))
            .merge(Serialized::defaults(Self::project_overrides(project_llm)));

        if let Some(path) = global_config
            && path.exists()
        {
            debug!("Loading global config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::raw().only(llm::ENV_KEYS));

        let settings: ProviderSettings = figment
            .extract()
            .map_err(|e| AdrError::Configuration(format!("Provider settings: {}", e)))?;

        settings.validate()?;
        debug!(?settings, "Resolved provider settings");
        Ok(settings)
    }

    /// Translate the project `llm` section into flat settings keys.
    fn project_overrides(project_llm: &LlmConfig) -> Map<String, Value> {
        let mut overrides = Map::new();
        let provider = project_llm
            .provider
            .clone()
            .unwrap_or_else(|| llm::DEFAULT_PROVIDER.to_string());

        if project_llm.provider.is_some() {
            overrides.insert("llm_provider".into(), Value::from(provider.clone()));
        }
        if let Some(model) = &project_llm.model {
            let key = match provider.to_lowercase().as_str() {
                "groq" => "groq_model",
                "gemini" => "gemini_model",
                _ => "openai_model",
            };
            overrides.insert(key.into(), Value::from(model.clone()));
        }
        if let Some(temperature) = project_llm.temperature {
            overrides.insert("temperature".into(), Value::from(f64::from(temperature)));
        }
        if let Some(max_tokens) = project_llm.max_tokens {
            overrides.insert("max_tokens".into(), Value::from(max_tokens));
        }
        overrides
    }

    /// `config.toml` in the platform config directory for adrsynth.
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "adrsynth")
            .map(|dirs| dirs.config_dir().join(paths::GLOBAL_CONFIG_FILE))
    }

    /// Write a global provider-settings template. API keys are left out; they
    /// belong in the environment.
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let path = Self::global_config_path().ok_or_else(|| {
            AdrError::Configuration("Cannot determine global config directory".to_string())
        })?;
        Self::init_global_at(&path, force)?;
        Ok(path)
    }

    pub fn init_global_at(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AdrError::Configuration(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let defaults = ProviderSettings::default();
        let template = GlobalTemplate {
            llm_provider: &defaults.llm_provider,
            openai_model: &defaults.openai_model,
            groq_model: &defaults.groq_model,
            gemini_model: &defaults.gemini_model,
            temperature: defaults.temperature,
            llm_timeout_secs: defaults.llm_timeout_secs,
        };
        let content = toml::to_string_pretty(&template)
            .map_err(|e| AdrError::Configuration(format!("Global config template: {}", e)))?;
        fs::write(path, content)?;
        info!("Created global config: {}", path.display());
        Ok(())
    }

    /// Directory holding run state (checkpoints) for a project.
    pub fn state_dir(project_dir: &Path) -> PathBuf {
        project_dir.join(paths::STATE_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_provider_env() {
        for key in llm::ENV_KEYS {
            // SAFETY: env-mutating tests are serialized
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_missing_file_synthesizes_defaults() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("shop-app");
        fs::create_dir_all(&project).unwrap();

        let config = ConfigLoader::load_project(&project).unwrap();

        assert_eq!(config.project_name, "shop-app");
        assert_eq!(config.terraform_minor, "cloud_evolucion_menor.tf");
        assert_eq!(config.terraform_major, "cloud_evolucion_mayor.tf");
        assert_eq!(config.source_code_zip.as_deref(), Some("app.zip"));
        assert_eq!(config.knowledge_base, "knowledge/IAC.txt");
        assert_eq!(config.llm.provider.as_deref(), Some("openai"));
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.llm.temperature, Some(0.3));
        assert_eq!(config.llm.max_tokens, Some(2000));
        assert_eq!(config.context_generation.max_files, 10);
        assert_eq!(config.context_generation.max_file_size, 5000);
        assert!(config.context_generation.summarize_large_files);
    }

    #[test]
    fn test_yaml_overrides_per_field() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("project-config.yaml"),
            r#"
project_name: inventory
source_code_zip_minor: minor.zip
llm:
  provider: groq
context_generation:
  max_files: 3
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_project(temp.path()).unwrap();

        assert_eq!(config.project_name, "inventory");
        assert_eq!(config.source_code_zip_minor.as_deref(), Some("minor.zip"));
        assert_eq!(config.source_code_zip, None);
        assert_eq!(config.terraform_major, "cloud_evolucion_mayor.tf");
        assert_eq!(config.llm.provider.as_deref(), Some("groq"));
        assert_eq!(config.llm.model, None);
        assert_eq!(config.context_generation.max_files, 3);
        assert_eq!(config.context_generation.max_file_size, 5000);
    }

    #[test]
    fn test_invalid_yaml_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("project-config.yaml"),
            "context_generation:\n  max_files: many\n",
        )
        .unwrap();

        let result = ConfigLoader::load_project(temp.path());
        assert!(matches!(result, Err(AdrError::Configuration(_))));
    }

    #[test]
    fn test_init_project_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = ConfigLoader::init_project(temp.path(), false).unwrap();
        assert!(path.exists());

        let loaded = ConfigLoader::load_project(temp.path()).unwrap();
        assert_eq!(loaded, ProjectConfig::synthesized_for(temp.path()));

        assert!(ConfigLoader::init_project(temp.path(), false).is_err());
        assert!(ConfigLoader::init_project(temp.path(), true).is_ok());
    }

    #[test]
    #[serial]
    fn test_project_llm_section_applies_to_settings() {
        clear_provider_env();
        let project_llm = LlmConfig {
            provider: Some("gemini".into()),
            model: Some("gemini-2.0-flash".into()),
            temperature: Some(0.3),
            max_tokens: Some(2000),
        };

        let settings = ConfigLoader::load_provider_settings_from(&project_llm, None).unwrap();

        assert_eq!(settings.llm_provider, "gemini");
        assert_eq!(settings.gemini_model, "gemini-2.0-flash");
        assert_eq!(settings.openai_model, llm::DEFAULT_OPENAI_MODEL);
        assert!((settings.temperature - 0.3).abs() < 1e-6);
        assert_eq!(settings.max_tokens, Some(2000));
    }

    #[test]
    #[serial]
    fn test_env_overrides_project_and_global() {
        clear_provider_env();
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        fs::write(&global, "groq_model = \"from-global\"\ntemperature = 0.5\n").unwrap();

        // SAFETY: env-mutating tests are serialized
        unsafe {
            std::env::set_var("LLM_PROVIDER", "groq");
            std::env::set_var("GROQ_API_KEY", "gsk-test");
            std::env::set_var("TEMPERATURE", "0.2");
        }

        let project_llm = LlmConfig {
            provider: Some("openai".into()),
            ..LlmConfig::default()
        };
        let settings =
            ConfigLoader::load_provider_settings_from(&project_llm, Some(&global)).unwrap();
        clear_provider_env();

        assert_eq!(settings.llm_provider, "groq");
        assert_eq!(settings.groq_api_key.as_deref(), Some("gsk-test"));
        assert_eq!(settings.groq_model, "from-global");
        assert!((settings.temperature - 0.2).abs() < 1e-6);
    }

    #[test]
    #[serial]
    fn test_global_template_loads_back() {
        clear_provider_env();
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("adrsynth").join("config.toml");
        ConfigLoader::init_global_at(&global, false).unwrap();

        let content = fs::read_to_string(&global).unwrap();
        assert!(!content.contains("api_key"));
        assert!(ConfigLoader::init_global_at(&global, false).is_err());

        let settings =
            ConfigLoader::load_provider_settings_from(&LlmConfig::default(), Some(&global))
                .unwrap();
        assert_eq!(settings, ProviderSettings::default());
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_provider_env();
        let settings =
            ConfigLoader::load_provider_settings_from(&LlmConfig::default(), None).unwrap();
        assert_eq!(settings, ProviderSettings::default());
    }
}
