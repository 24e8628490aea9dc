// src/config/build.rs

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{ConfigFile, PipelineConfig, StepConfig};
use crate::errors::Result;
use crate::filter::{ConcatFilter, FilterStage, GsubFilter, OrderingConcatFilter, fixed_namer};
use crate::pipeline::{BuildContext, Matcher, Pipeline, RejectMatcher, SortedStage, Stage};

/// Turn a validated config into pipelines.
///
/// Relative paths in the config resolve against `base_dir` (the directory
/// holding the config file). Pipeline `n` keeps its temp directories and
/// manifest under `<tmp_root>/pipeline-<n>`. Every pipeline shares `ctx` and
/// is finalized, so generated files are copied into its output root.
pub fn build_pipelines(
    cfg: &ConfigFile,
    base_dir: &Path,
    tmp_root: &Path,
    ctx: &Arc<BuildContext>,
) -> Result<Vec<Pipeline>> {
    cfg.pipelines
        .iter()
        .enumerate()
        .map(|(idx, pipeline)| build_pipeline(cfg, idx, pipeline, base_dir, tmp_root, ctx))
        .collect()
}

fn build_pipeline(
    cfg: &ConfigFile,
    idx: usize,
    pipeline_cfg: &PipelineConfig,
    base_dir: &Path,
    tmp_root: &Path,
    ctx: &Arc<BuildContext>,
) -> Result<Pipeline> {
    let mut pipeline = Pipeline::new().with_context(Arc::clone(ctx));

    for input in &pipeline_cfg.inputs {
        pipeline.add_input(base_dir.join(&input.root), Some(&input.glob));
    }

    let output = pipeline_cfg.output.as_deref().unwrap_or(cfg.output());
    pipeline
        .set_output_root(base_dir.join(output))
        .set_tmp_root(tmp_root)
        .set_tmp_subdir(format!("pipeline-{}", idx + 1));

    for step in &pipeline_cfg.steps {
        pipeline.add_boxed_stage(build_stage(step)?);
    }
    pipeline.finalize();

    debug!(pipeline = idx + 1, steps = pipeline_cfg.steps.len(), "built pipeline from config");
    Ok(pipeline)
}

/// Build one stage (recursively for `match`).
pub fn build_stage(step: &StepConfig) -> Result<Box<dyn Stage>> {
    let stage: Box<dyn Stage> = match step {
        StepConfig::Concat { output, order } => {
            let stage = if order.is_empty() {
                FilterStage::new(ConcatFilter::new())
            } else {
                FilterStage::new(OrderingConcatFilter::new(order.iter().cloned()))
            };
            match output {
                Some(name) => Box::new(stage.with_namer(fixed_namer(name.clone()))),
                None => Box::new(stage),
            }
        }
        StepConfig::Copy => Box::new(FilterStage::new(ConcatFilter::new())),
        StepConfig::Gsub { pattern, replacement } => {
            Box::new(FilterStage::new(GsubFilter::new(pattern, replacement.clone())?))
        }
        StepConfig::Match { glob, steps } => {
            let mut matcher = Matcher::glob(glob)?;
            for nested in steps {
                matcher.add_boxed_stage(build_stage(nested)?);
            }
            Box::new(matcher)
        }
        StepConfig::Reject { glob } => Box::new(RejectMatcher::glob(glob)?),
        StepConfig::Sort { reverse } => Box::new(SortedStage::new().reversed(*reverse)),
    };
    Ok(stage)
}
