use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adrsynth::cli::Format;
use adrsynth::cli::commands::{config, generate, inspect, parse};

#[derive(Parser)]
#[command(name = "adrsynth")]
#[command(
    version,
    about = "Generate Architecture Decision Records from an architecture's evolution"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis workflow and write the decision records
    Generate {
        #[arg(help = "Project directory (holds project-config.yaml)")]
        project_dir: PathBuf,
        #[arg(long, short, help = "Output directory (default: <PROJECT_DIR>/output-adrs)")]
        output: Option<PathBuf>,
        #[arg(long, help = "LLM provider (openai, groq, gemini)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Skip the Terraform analysis steps")]
        no_terraform: bool,
        #[arg(long, help = "Generate the theoretical context with the model")]
        regenerate_context: bool,
        #[arg(long, help = "Run without theoretical context")]
        no_knowledge: bool,
        #[arg(long, help = "Also write a consolidated JSON export")]
        json: bool,
        #[arg(
            long,
            value_name = "RUN_ID",
            conflicts_with = "no_checkpoint",
            help = "Resume a previous run from its latest checkpoint"
        )]
        resume: Option<String>,
        #[arg(long, help = "Keep checkpoints in memory only")]
        no_checkpoint: bool,
        #[arg(long, value_name = "SECS", help = "Deadline for each workflow step")]
        step_timeout: Option<u64>,
    },

    /// List runs or show one run's latest checkpoint
    Inspect {
        project_dir: PathBuf,
        run_id: Option<String>,
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Recover records from a Markdown ADR file
    Parse {
        file: PathBuf,
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Manage project configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        project_dir: PathBuf,
        #[arg(short = 'f', long, value_enum, default_value = "yaml")]
        format: Format,
    },
    /// Write the default project-config.yaml (or the global config.toml)
    Init {
        #[arg(required_unless_present = "global")]
        project_dir: Option<PathBuf>,
        #[arg(long, short, help = "Initialize the global provider settings instead")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31madrsynth hit an internal error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mat {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            adrsynth::cli::Output::new().error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            project_dir,
            output,
            provider,
            model,
            no_terraform,
            regenerate_context,
            no_knowledge,
            json,
            resume,
            no_checkpoint,
            step_timeout,
        } => {
            generate::run(generate::GenerateOptions {
                project_dir,
                output,
                provider,
                model,
                no_terraform,
                regenerate_context,
                no_knowledge,
                json,
                resume,
                no_checkpoint,
                step_timeout_secs: step_timeout,
                quiet: cli.quiet,
            })?;
        }
        Commands::Inspect {
            project_dir,
            run_id,
            format,
        } => {
            inspect::run(&project_dir, run_id.as_deref(), format)?;
        }
        Commands::Parse { file, format } => {
            parse::run(&file, format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show {
                project_dir,
                format,
            } => config::show(&project_dir, format)?,
            ConfigAction::Init {
                project_dir,
                global,
                force,
            } => match project_dir {
                Some(dir) if !global => config::init(&dir, force)?,
                _ => config::init_global(force)?,
            },
        },
    }

    Ok(())
}
