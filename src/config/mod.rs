//! Configuration Management
//!
//! Two layers:
//! 1. Project config (`project-config.yaml`) with file paths and extraction knobs
//! 2. Provider settings (defaults → project `llm` → global TOML → env → CLI flags)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
