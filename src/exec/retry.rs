// src/exec/retry.rs

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::result::TaskResult;
use crate::task::Task;
use crate::types::TaskStatus;

use super::strategy::{interrupted, ExecutionStrategy};

/// Decorator that re-runs failed attempts according to the task's
/// [`RetryPolicy`](crate::task::RetryPolicy).
///
/// - Tasks without a policy are delegated to the inner strategy untouched.
/// - Only `Failure` is retried; `Success`, `Skipped` and `Cancelled` return
///   immediately.
/// - `should_retry` returning `false` stops retrying.
/// - The delay between attempts is cancellable.
/// - When attempts run out, the last failure is returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct RetryStrategy<S> {
    inner: S,
}

impl<S> RetryStrategy<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<C, S> ExecutionStrategy<C> for RetryStrategy<S>
where
    C: Send + Sync + 'static,
    S: ExecutionStrategy<C>,
{
    fn execute<'a>(
        &'a self,
        task: &'a Task<C>,
        context: Arc<C>,
        token: CancellationToken,
    ) -> BoxFuture<'a, TaskResult> {
        async move {
            let Some(policy) = task.retry.as_ref() else {
                return self.inner.execute(task, context, token).await;
            };

            let max_attempts = policy.attempts.saturating_add(1);
            let mut attempt: u32 = 1;

            loop {
                if token.is_cancelled() {
                    let message = if attempt == 1 {
                        "Task cancelled before execution".to_string()
                    } else {
                        format!("Task cancelled before attempt {attempt}")
                    };
                    return interrupted(&token, message);
                }

                let result = self
                    .inner
                    .execute(task, Arc::clone(&context), token.clone())
                    .await;

                if result.status != TaskStatus::Failure {
                    return result;
                }

                if attempt >= max_attempts {
                    debug!(task = %task.name, attempts = attempt, "retry attempts exhausted");
                    return result;
                }

                if let Some(should_retry) = &policy.should_retry {
                    let error = result.error.as_deref().unwrap_or_default();
                    if !should_retry(error) {
                        debug!(task = %task.name, attempt, "should_retry declined; giving up");
                        return result;
                    }
                }

                let delay = policy.backoff.delay_for(policy.delay, attempt);
                info!(
                    task = %task.name,
                    attempt,
                    max_attempts,
                    delay = ?delay,
                    error = result.error.as_deref().unwrap_or_default(),
                    "task attempt failed; retrying"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => {
                        return interrupted(&token, "Task cancelled during retry delay");
                    }
                }

                attempt += 1;
            }
        }
        .boxed()
    }
}
