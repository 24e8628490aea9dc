// src/config/mod.rs

//! TOML project description.
//!
//! - `model.rs`: the serde data model.
//! - `loader.rs`: reading and parsing.
//! - `validate.rs`: checks run by `ConfigFile::try_from`.
//! - `build.rs`: turning a validated config into [`crate::pipeline::Pipeline`]s.

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::{build_pipelines, build_stage};
pub use loader::{
    DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, parse_and_validate,
    parse_str,
};
pub use model::{ConfigFile, InputConfig, PipelineConfig, ProjectSection, RawConfigFile, StepConfig};
pub use validate::validate_raw_config;
