// src/logging.rs

//! Optional subscriber setup for applications embedding `dagrun`.
//!
//! The engine only emits `tracing` events. Filter resolution:
//! 1. an explicit [`LogLevel`] applies to every target;
//! 2. otherwise `DAGRUN_LOG` is read as `EnvFilter` directives
//!    (`"debug"`, `"dagrun=debug,hyper=warn"`, ...);
//! 3. otherwise `info`.
//!
//! Output goes to stderr.

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::types::LogLevel;

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV_VAR: &str = "DAGRUN_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let filter = match level {
        Some(lvl) => EnvFilter::default().add_directive(level_filter(lvl).into()),
        None => EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(LevelFilter::INFO.to_string())),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn level_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
