// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Incremental asset pipeline: filters input files into output files, rebuilding only what changed.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML).
    ///
    /// Default: `Assetfile.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build every pipeline once (the default).
    Build {
        /// Also remove temp directories left by older versions of the
        /// project file.
        #[arg(long)]
        cleanup_tmpdir: bool,
    },
    /// Remove generated output files and temp directories.
    Clean,
    /// Build, then rebuild whenever inputs or the project file change.
    Watch {
        /// Quiet period in milliseconds collected into one rebuild.
        #[arg(long, value_name = "MS", default_value_t = 200)]
        debounce_ms: u64,
    },
    /// Print pipelines, inputs and planned outputs without building.
    Plan,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
