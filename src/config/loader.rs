// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Default project file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "Assetfile.toml";

/// Parse TOML source without validating it.
pub fn parse_str(source: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(source)?)
}

/// Load a config file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Parse and validate TOML source.
pub fn parse_and_validate(source: &str) -> Result<ConfigFile> {
    ConfigFile::try_from(parse_str(source)?)
}

/// Load and validate a config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}
