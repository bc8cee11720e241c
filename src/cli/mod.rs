pub mod commands;
pub mod ui;

pub use ui::Output;

/// Output format shared by the read-only commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
    Yaml,
}
