//! docpilot CLI: the main entry point.
//!
//! Commands:
//! - `chat`     Ask questions grounded in uploads and directory pools
//! - `status`   Show backend health and the model inventory
//! - `dirs`     List the project and reference directories
//! - `classify` Classify file names by version marker (offline)
//! - `config`   Show, initialise or locate the config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "docpilot",
    about = "docpilot: document-grounded chat against project and reference files",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat about your documents
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Upload a file before chatting (repeatable)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Leave the project directory out of the context
        #[arg(long)]
        no_project: bool,

        /// Leave the reference directory out of the context
        #[arg(long)]
        no_reference: bool,

        /// Preferred backend (`local` or `cloud`)
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// Show backend health and available models
    Status,

    /// List the project and reference directories
    Dirs {
        /// Ask the backend to rescan before listing
        #[arg(long)]
        refresh: bool,

        /// Only show the latest version of each document
        #[arg(long)]
        latest: bool,
    },

    /// Classify file names by their version marker
    Classify {
        /// File names or paths
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file if none exists
    Init,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat {
            message,
            files,
            no_project,
            no_reference,
            backend,
        } => {
            commands::chat::run(commands::chat::ChatArgs {
                message,
                files,
                no_project,
                no_reference,
                backend,
            })
            .await?
        }
        Commands::Status => commands::status::run().await?,
        Commands::Dirs { refresh, latest } => commands::dirs::run(refresh, latest).await?,
        Commands::Classify { names } => commands::classify::run(&names)?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}
