// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetflowError {
    /// File content is not valid in the handle's declared encoding.
    #[error("The file at the path {path:?} is not valid UTF-8. Please save it again as UTF-8.")]
    Encoding { path: PathBuf },

    #[error("Cannot write to {path:?}: the file has not been created")]
    UnopenedFile { path: PathBuf },

    #[error("Dynamic task '{task}' cannot be invoked without a manifest")]
    ManifestRequired { task: String },

    #[error("You cannot get input files without first providing input files or an input root")]
    MissingInputConfiguration,

    #[error("Node {0} does not exist")]
    MissingNode(String),

    #[error("Don't know how to build '{prerequisite}' (needed by '{task}')")]
    MissingPrerequisite { task: String, prerequisite: String },

    #[error("Circular dependency detected: {0}")]
    Cycle(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Manifest JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Invalid regular expression: {0}")]
    RegexError(#[from] regex::Error),

    #[error("File watch error: {0}")]
    NotifyError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
