// src/exec/standard.rs

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::cancel::{CancelReason, CancellationToken};
use crate::result::TaskResult;
use crate::task::{Condition, Task};

use super::strategy::{interrupted, ExecutionStrategy};

/// Runs a task exactly once.
///
/// Order of checks:
/// 1. `condition` (if any): an error fails the task, `false` skips it.
/// 2. token already cancelled: the body is never invoked.
/// 3. body, raced against `timeout` if one is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStrategy;

impl<C> ExecutionStrategy<C> for StandardStrategy
where
    C: Send + Sync + 'static,
{
    fn execute<'a>(
        &'a self,
        task: &'a Task<C>,
        context: Arc<C>,
        token: CancellationToken,
    ) -> BoxFuture<'a, TaskResult> {
        run_once(task, context, token).boxed()
    }
}

enum Verdict {
    Run,
    Skip,
    Cancelled,
    Failed(anyhow::Error),
}

async fn run_once<C>(task: &Task<C>, context: Arc<C>, token: CancellationToken) -> TaskResult
where
    C: Send + Sync + 'static,
{
    if let Some(condition) = &task.condition {
        match evaluate_condition(condition, &context, &token).await {
            Verdict::Run => {}
            Verdict::Skip => {
                debug!(task = %task.name, "condition not met; skipping");
                return TaskResult::skipped("Condition not met");
            }
            Verdict::Cancelled => {
                return interrupted(&token, "Task cancelled while evaluating condition");
            }
            Verdict::Failed(err) => {
                return TaskResult::failure(format!("Condition evaluation failed: {err:#}"));
            }
        }
    }

    if token.is_cancelled() {
        return interrupted(&token, "Task cancelled before execution");
    }

    let Some(limit) = task.timeout else {
        return run_body(task, context, token).await;
    };

    // The body gets a task-scoped token so that a timeout can cancel it
    // without touching the rest of the run.
    let scoped = token.child_token();
    let body = run_body(task, context, scoped.clone());

    tokio::select! {
        result = body => result,
        _ = tokio::time::sleep(limit) => {
            scoped.cancel_with(CancelReason::Timeout(limit));
            warn!(
                task = %task.name,
                timeout = ?limit,
                "task timed out"
            );
            TaskResult::failure(format!("Task timed out after {}ms", limit.as_millis()))
        }
    }
}

async fn evaluate_condition<C>(
    condition: &Condition<C>,
    context: &Arc<C>,
    token: &CancellationToken,
) -> Verdict
where
    C: Send + Sync + 'static,
{
    let outcome = match condition {
        Condition::Sync(predicate) => {
            let predicate = Arc::clone(predicate);
            let ctx = Arc::clone(context);
            guarded(async move { predicate(ctx.as_ref()) }).await
        }
        Condition::Async(predicate) => {
            let predicate = Arc::clone(predicate);
            let ctx = Arc::clone(context);
            // Call the predicate inside the guard so a panic before its
            // future exists is still caught.
            let fut = guarded(async move { predicate(ctx).await });
            tokio::select! {
                outcome = fut => outcome,
                _ = token.cancelled() => return Verdict::Cancelled,
            }
        }
    };

    match outcome {
        Ok(true) => Verdict::Run,
        Ok(false) => Verdict::Skip,
        Err(_) if token.is_cancelled() => Verdict::Cancelled,
        Err(err) => Verdict::Failed(err),
    }
}

async fn run_body<C>(task: &Task<C>, context: Arc<C>, token: CancellationToken) -> TaskResult
where
    C: Send + Sync + 'static,
{
    debug!(task = %task.name, "invoking task body");

    let body_token = token.clone();
    match guarded(async move { task.invoke(context, body_token).await }).await {
        Ok(result) => result,
        Err(err) if token.is_cancelled() => {
            debug!(task = %task.name, error = %err, "task body failed after cancellation");
            interrupted(&token, "Task cancelled during execution")
        }
        Err(err) => TaskResult::failure(format!("{err:#}")),
    }
}

/// Await `fut`, turning a panic into an error.
async fn guarded<T>(fut: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(anyhow!("panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
