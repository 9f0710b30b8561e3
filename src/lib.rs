// src/lib.rs

pub mod cancel;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod result;
pub mod task;
pub mod types;
pub mod visualize;

use std::collections::HashMap;
use std::sync::Arc;

pub use crate::cancel::{CancelReason, CancellationToken};
pub use crate::config::RunConfig;
pub use crate::dag::{validate, ValidationErrorKind, ValidationResult};
pub use crate::engine::{EventKind, EventNotifier, Listener, Plugin, WorkflowEvent, WorkflowExecutor};
pub use crate::errors::{DagrunError, Result};
pub use crate::result::{RunSummary, TaskMetrics, TaskResult};
pub use crate::task::{RetryPolicy, Task};
pub use crate::types::{Backoff, TaskStatus};

/// Run `tasks` once with a fresh default executor.
///
/// Convenience for callers that need neither plugins nor a custom strategy.
pub async fn execute<C>(
    tasks: &[Task<C>],
    context: Arc<C>,
    config: RunConfig,
) -> Result<HashMap<String, TaskResult>>
where
    C: Send + Sync + 'static,
{
    WorkflowExecutor::new().execute(tasks, context, config).await
}
