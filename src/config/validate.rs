// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, PipelineConfig, RawConfigFile, StepConfig};
use crate::errors::{AssetflowError, Result};
use crate::pattern::GlobMatcher;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.project, raw.pipelines))
    }
}

/// Check a raw config without consuming it.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_project(cfg)?;
    ensure_has_pipelines(cfg)?;
    for (idx, pipeline) in cfg.pipelines.iter().enumerate() {
        validate_pipeline(idx, pipeline)?;
    }
    Ok(())
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    match cfg.project.output.as_deref() {
        Some(output) if !output.trim().is_empty() => {}
        _ => {
            return Err(AssetflowError::ConfigError(
                "[project].output must be set to the default output directory".to_string(),
            ));
        }
    }

    if cfg.project.tmpdir.trim().is_empty() {
        return Err(AssetflowError::ConfigError(
            "[project].tmpdir must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn ensure_has_pipelines(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipelines.is_empty() {
        return Err(AssetflowError::ConfigError(
            "config must contain at least one [[pipeline]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipeline(idx: usize, pipeline: &PipelineConfig) -> Result<()> {
    if pipeline.inputs.is_empty() {
        return Err(AssetflowError::ConfigError(format!(
            "pipeline #{} has no inputs",
            idx + 1
        )));
    }

    for input in &pipeline.inputs {
        if input.root.trim().is_empty() {
            return Err(AssetflowError::ConfigError(format!(
                "pipeline #{} has an input with an empty root",
                idx + 1
            )));
        }
        check_glob(idx, &input.glob)?;
    }

    validate_steps(idx, &pipeline.steps)
}

fn validate_steps(idx: usize, steps: &[StepConfig]) -> Result<()> {
    for step in steps {
        match step {
            StepConfig::Match { glob, steps } => {
                check_glob(idx, glob)?;
                validate_steps(idx, steps)?;
            }
            StepConfig::Reject { glob } => check_glob(idx, glob)?,
            StepConfig::Gsub { pattern, .. } => {
                Regex::new(pattern).map_err(|e| {
                    AssetflowError::ConfigError(format!(
                        "pipeline #{} has an invalid gsub pattern '{}': {}",
                        idx + 1,
                        pattern,
                        e
                    ))
                })?;
            }
            StepConfig::Concat { output: Some(output), .. } if output.trim().is_empty() => {
                return Err(AssetflowError::ConfigError(format!(
                    "pipeline #{} has a concat step with an empty output name",
                    idx + 1
                )));
            }
            StepConfig::Concat { .. } | StepConfig::Copy | StepConfig::Sort { .. } => {}
        }
    }
    Ok(())
}

fn check_glob(idx: usize, glob: &str) -> Result<()> {
    if glob.trim().is_empty() {
        return Err(AssetflowError::ConfigError(format!(
            "pipeline #{} has an empty glob",
            idx + 1
        )));
    }

    GlobMatcher::new(glob).map_err(|e| {
        AssetflowError::ConfigError(format!(
            "pipeline #{} has an invalid glob '{}': {}",
            idx + 1,
            glob,
            e
        ))
    })?;
    Ok(())
}
