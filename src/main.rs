use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Kanban task board for the project-management gateway")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Path to taskboard.toml. Defaults to .taskboard/taskboard.toml in the project directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace to open. Overrides TASKBOARD_WORKSPACE_ID and the config file
    #[arg(short, long, global = true)]
    pub workspace: Option<i64>,

    /// Gateway base URL. Overrides TASKBOARD_GATEWAY_URL and the config file
    #[arg(long, global = true)]
    pub gateway_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board or change a task's status
    Board {
        #[command(subcommand)]
        command: Option<BoardCommands>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum BoardCommands {
    /// Show all columns and their tasks
    Show {
        /// Print the raw status groups as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the workspace's statuses in column order
    Statuses,
    /// Move a task to another status
    Move {
        /// Task id
        task_id: i64,
        /// Target status code (e.g. DONE)
        status: String,
        /// Reassign the task at the same time
        #[arg(long)]
        assignee: Option<i64>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default taskboard.toml file
    Init,
}

/// Logs go to stderr. `RUST_LOG` wins; otherwise `warn`, or `debug` with
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "taskboard=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // Project-level .env first; dotenvy never overrides variables already set.
    dotenvy::from_path(project_dir.join(".env")).ok();
    dotenvy::dotenv().ok();

    match &cli.command {
        Commands::Board { command } => {
            cmd::cmd_board(&cli, &project_dir, command.clone()).await?;
        }
        Commands::Config { command } => cmd::cmd_config(&cli, &project_dir, command.clone())?,
    }

    Ok(())
}
