// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::cancel::CancellationToken;
use crate::types::LogLevel;

/// Options for one `execute` call.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Maximum number of tasks in flight. `None` means unbounded; `Some(0)`
    /// is treated as 1.
    pub concurrency: Option<usize>,
    /// External cancellation. The run derives its own child token from it.
    pub cancel: Option<CancellationToken>,
    /// Wall-clock limit for the whole run.
    pub timeout: Option<Duration>,
    /// Use the dry-run strategy instead of the configured one.
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }

    /// Build a run config from validated file settings.
    pub fn from_settings(settings: &RunSettings) -> Self {
        Self {
            concurrency: settings.concurrency,
            cancel: None,
            timeout: settings.timeout_ms.map(Duration::from_millis),
            dry_run: settings.dry_run,
        }
    }
}

/// `[run]` table of a settings file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    pub concurrency: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub dry_run: bool,
    pub log_level: Option<LogLevel>,
}

/// Settings file as deserialized, before semantic validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettingsFile {
    #[serde(default)]
    pub run: RunSettings,
}

/// Validated settings file. Construct through `TryFrom<RawSettingsFile>`.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    pub run: RunSettings,
}

impl SettingsFile {
    pub(crate) fn new_unchecked(run: RunSettings) -> Self {
        Self { run }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::from_settings(&self.run)
    }

    /// Install the global subscriber using `[run].log_level`, falling back
    /// to `DAGRUN_LOG` when the file leaves it unset.
    pub fn init_logging(&self) -> anyhow::Result<()> {
        crate::logging::init_logging(self.run.log_level)
    }
}
