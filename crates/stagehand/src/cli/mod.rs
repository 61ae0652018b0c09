//! CLI definition and command handling

pub mod commands;
mod host;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use stagehand_core::config::{load_config_or_default, resolve_catalog_path, Config};

use commands::{
    CleanupCommand, CompletionsCommand, IntakeCommand, ListCommand, NormalizeCommand,
    PublishCommand,
};
pub use host::Host;

/// Stagehand - release manager for mobile app builds
#[derive(Debug, Parser)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the apps.json catalog
    #[arg(long = "config", global = true, env = "STAGEHAND_APPS")]
    pub catalog: Option<PathBuf>,

    /// Show what would change without touching files or the remote
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish build artifacts to a GitHub release and record them
    Publish(PublishCommand),

    /// Delete releases and assets the catalog no longer references
    Cleanup(CleanupCommand),

    /// Rewrite catalog asset names and tags to canonical form
    Normalize(NormalizeCommand),

    /// Show the latest build per stage and its download links
    List(ListCommand),

    /// Forward a TestFlight access request to the operator
    Intake(IntakeCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Publish(ref cmd) => cmd.execute(&self),
            Commands::Cleanup(ref cmd) => cmd.execute(&self),
            Commands::Normalize(ref cmd) => cmd.execute(&self),
            Commands::List(ref cmd) => cmd.execute(&self),
            Commands::Intake(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }

    /// Whether prose output should be printed
    pub fn is_text(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }

    /// Tool configuration found from the working directory, or defaults
    pub fn tool_config(&self) -> anyhow::Result<Config> {
        let cwd = std::env::current_dir()?;
        let (config, path) = load_config_or_default(&cwd)?;
        debug!(path = ?path, "tool configuration resolved");
        Ok(config)
    }

    /// Catalog path from `--config`, the tool config, or the default
    pub fn catalog_path(&self, config: &Config) -> anyhow::Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(resolve_catalog_path(self.catalog.as_deref(), config, &cwd))
    }
}
