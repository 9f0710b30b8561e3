use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Terminal status of a task within one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Failure,
    Skipped,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Success => "success",
            TaskStatus::Failure => "failure",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Growth policy for the delay between retry attempts.
///
/// - `Fixed`: every retry waits the configured delay.
/// - `Exponential`: the delay doubles per attempt (`delay * 2^(attempt-1)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential,
}

impl Backoff {
    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for(self, base: Duration, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed => base,
            Backoff::Exponential => {
                let exp = attempt.saturating_sub(1).min(31);
                base.saturating_mul(1u32 << exp)
            }
        }
    }
}

impl FromStr for Backoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(Backoff::Fixed),
            "exponential" => Ok(Backoff::Exponential),
            other => Err(format!(
                "invalid backoff: {other} (expected \"fixed\" or \"exponential\")"
            )),
        }
    }
}

/// Log level accepted by [`crate::logging::init_logging`] and the `[run]`
/// settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}
