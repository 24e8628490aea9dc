// src/config/model.rs

use serde::Deserialize;

/// Raw project description as read from TOML, before validation.
///
/// ```toml
/// [project]
/// output = "public"
/// tmpdir = "tmp"
///
/// [[pipeline]]
/// inputs = [{ root = "app/assets", glob = "**/*.js" }]
///
/// [[pipeline.steps]]
/// kind = "concat"
/// output = "application.js"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default, rename = "pipeline")]
    pub pipelines: Vec<PipelineConfig>,
}

/// Validated project description. Build it with `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub pipelines: Vec<PipelineConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(project: ProjectSection, pipelines: Vec<PipelineConfig>) -> Self {
        Self { project, pipelines }
    }

    /// Default output root. Present on every validated config.
    pub fn output(&self) -> &str {
        self.project.output.as_deref().unwrap_or_default()
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Output root used by pipelines without their own `output`.
    #[serde(default)]
    pub output: Option<String>,

    /// Temp root; each build namespaces itself below it.
    #[serde(default = "default_tmpdir")]
    pub tmpdir: String,
}

fn default_tmpdir() -> String {
    "tmp".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            output: None,
            tmpdir: default_tmpdir(),
        }
    }
}

/// One `[[pipeline]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub inputs: Vec<InputConfig>,

    /// Overrides `project.output` for this pipeline.
    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub root: String,

    #[serde(default = "default_glob")]
    pub glob: String,
}

fn default_glob() -> String {
    crate::pipeline::DEFAULT_INPUT_GLOB.to_string()
}

/// One step of a pipeline, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepConfig {
    /// Concatenate into `output`, or keep each input's name when omitted.
    /// A non-empty `order` moves those inputs to the front first.
    Concat {
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        order: Vec<String>,
    },
    /// Copy each input under its own name.
    Copy,
    Gsub {
        pattern: String,
        #[serde(default)]
        replacement: String,
    },
    /// Run nested `steps` on files matching `glob` only.
    Match {
        glob: String,
        #[serde(default)]
        steps: Vec<StepConfig>,
    },
    /// Drop files matching `glob`.
    Reject { glob: String },
    Sort {
        #[serde(default)]
        reverse: bool,
    },
}
