use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `evd` binary.
#[derive(Debug, Parser)]
#[command(
    name = "evd",
    version,
    about = "Evidentia - evaluate evidence documents against compliance checklists"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress and non-error logs)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra config file layered above .evidentia/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// TOML file of compliance programs that extend or replace the built-ins
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            config: self.config.clone(),
            catalog: self.catalog.clone(),
        }
    }
}
