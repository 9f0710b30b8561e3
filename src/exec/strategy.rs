// src/exec/strategy.rs

//! Pluggable execution strategy abstraction.
//!
//! The workflow executor talks to an `ExecutionStrategy` instead of calling
//! task bodies directly. This makes it easy to layer behaviour (timeouts,
//! retries) and to swap in a fake strategy in tests.
//!
//! - [`StandardStrategy`](super::StandardStrategy) evaluates the task's
//!   condition, honours its timeout, and funnels every outcome into a
//!   `TaskResult`.
//! - [`RetryStrategy`](super::RetryStrategy) decorates any inner strategy
//!   with the task's retry policy.
//! - [`DryRunStrategy`](super::DryRunStrategy) never runs anything.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::cancel::{CancelReason, CancellationToken};
use crate::result::TaskResult;
use crate::task::Task;

/// Trait abstracting how a single task is executed.
///
/// Implementations never fail: errors, panics, timeouts and cancellation all
/// end up in the returned [`TaskResult`].
pub trait ExecutionStrategy<C>: Send + Sync
where
    C: Send + Sync + 'static,
{
    fn execute<'a>(
        &'a self,
        task: &'a Task<C>,
        context: Arc<C>,
        token: CancellationToken,
    ) -> BoxFuture<'a, TaskResult>;
}

impl<C, S> ExecutionStrategy<C> for Arc<S>
where
    C: Send + Sync + 'static,
    S: ExecutionStrategy<C> + ?Sized,
{
    fn execute<'a>(
        &'a self,
        task: &'a Task<C>,
        context: Arc<C>,
        token: CancellationToken,
    ) -> BoxFuture<'a, TaskResult> {
        (**self).execute(task, context, token)
    }
}

/// Result for work interrupted by `token`.
///
/// A workflow-level timeout is reported as a failure so that it stays
/// distinguishable from an external abort.
pub(crate) fn interrupted(token: &CancellationToken, message: impl Into<String>) -> TaskResult {
    match token.reason() {
        Some(CancelReason::Timeout(limit)) => TaskResult::failure(format!(
            "Workflow timed out after {}ms",
            limit.as_millis()
        )),
        _ => TaskResult::cancelled(message),
    }
}
