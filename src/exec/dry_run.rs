// src/exec/dry_run.rs

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::result::TaskResult;
use crate::task::Task;

use super::strategy::ExecutionStrategy;

/// Reports success for every task without invoking its body or condition.
///
/// Used to check graph shape and scheduling order without side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunStrategy;

impl<C> ExecutionStrategy<C> for DryRunStrategy
where
    C: Send + Sync + 'static,
{
    fn execute<'a>(
        &'a self,
        task: &'a Task<C>,
        _context: Arc<C>,
        _token: CancellationToken,
    ) -> BoxFuture<'a, TaskResult> {
        debug!(task = %task.name, "dry run; not invoking task body");
        let result =
            TaskResult::success().with_message(format!("Dry run: task '{}' would execute", task.name));
        async move { result }.boxed()
    }
}
