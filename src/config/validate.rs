// src/config/validate.rs

use crate::config::model::{RawSettingsFile, RunSettings, SettingsFile};
use crate::errors::{DagrunError, Result};

impl TryFrom<RawSettingsFile> for SettingsFile {
    type Error = DagrunError;

    fn try_from(raw: RawSettingsFile) -> std::result::Result<Self, Self::Error> {
        validate_run_settings(&raw.run)?;
        Ok(SettingsFile::new_unchecked(raw.run))
    }
}

fn validate_run_settings(run: &RunSettings) -> Result<()> {
    if run.concurrency == Some(0) {
        return Err(DagrunError::ConfigError(
            "[run].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    if run.timeout_ms == Some(0) {
        return Err(DagrunError::ConfigError(
            "[run].timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
