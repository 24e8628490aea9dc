// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod file;
pub mod filter;
pub mod fs;
pub mod logging;
pub mod manifest;
pub mod pattern;
pub mod pipeline;
pub mod project;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::pipeline::Stage;
use crate::project::Project;

pub use crate::errors::AssetflowError;
pub use crate::file::FileHandle;
pub use crate::filter::{Filter, FilterStage};
pub use crate::pipeline::Pipeline;

/// High-level entry point used by `main.rs`.
///
/// Loads the project file, then runs the requested command:
/// - `build` (default): invoke every pipeline once
/// - `clean`: remove outputs and temp directories
/// - `watch`: build, then rebuild on change until interrupted
/// - `plan`: print what would be built
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let project = Project::from_config_path(&config_path)?;

    match args.command.unwrap_or(Command::Build {
        cleanup_tmpdir: false,
    }) {
        Command::Build { cleanup_tmpdir } => {
            if cleanup_tmpdir {
                project.cleanup_tmpdir()?;
            }
            project.invoke()?;
            info!("build finished");
        }
        Command::Clean => project.clean()?,
        Command::Watch { debounce_ms } => {
            watch::watch_project(&project, Duration::from_millis(debounce_ms))?;
        }
        Command::Plan => print_plan(&project)?,
    }

    Ok(())
}

/// Print each pipeline's inputs, steps and planned outputs.
fn print_plan(project: &Project) -> Result<()> {
    println!("assetflow plan");
    if let Some(path) = project.config_path() {
        println!("  config = {}", path.display());
    }
    if let Some(digest) = project.digest() {
        println!("  digest = {digest}");
    }
    println!("  tmpdir = {}", project.digested_tmpdir().display());
    println!();

    project.with_pipelines(|pipelines| -> Result<()> {
        for (idx, pipeline) in pipelines.iter_mut().enumerate() {
            pipeline.setup()?;

            println!("pipeline #{}", idx + 1);
            for (root, glob) in pipeline.inputs() {
                println!("  input: {} ({glob})", root.display());
            }
            if let Some(root) = Stage::output_root(pipeline) {
                println!("  output: {}", root.display());
            }
            for stage in pipeline.stages() {
                println!("  step: {}", stage.describe());
            }

            let outputs = pipeline.output_files()?;
            println!("  files ({}):", outputs.len());
            for file in outputs {
                println!("    - {}", file.path());
            }
            println!();
        }
        Ok(())
    })?;

    debug!("plan complete (nothing built)");
    Ok(())
}
