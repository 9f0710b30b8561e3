// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawSettingsFile, SettingsFile};
use crate::errors::Result;

/// Read a settings file without semantic checks.
///
/// Unknown keys are still rejected by deserialization. Use
/// [`load_and_validate`] to also check value ranges.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettingsFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "read settings file");

    Ok(toml::from_str(&contents)?)
}

/// Read a settings file and validate it.
///
/// Missing keys fall back to `serde` defaults; a zero `concurrency` or
/// `timeout_ms` is a [`ConfigError`](crate::errors::DagrunError::ConfigError).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SettingsFile> {
    SettingsFile::try_from(load_from_path(path)?)
}

/// [`load_and_validate`] for settings already held in memory.
pub fn parse_and_validate(contents: &str) -> Result<SettingsFile> {
    let raw: RawSettingsFile = toml::from_str(contents)?;
    SettingsFile::try_from(raw)
}

/// `Dagrun.toml`, relative to the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dagrun.toml")
}
