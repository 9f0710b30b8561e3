// src/task.rs

//! Caller-supplied task definitions.
//!
//! A [`Task`] is generic over the shared context type `C`. The engine hands
//! each body an `Arc<C>` (the same allocation for every task in a run) plus
//! the run's [`CancellationToken`]; it never clones the context value and
//! never locks it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::cancel::CancellationToken;
use crate::dag::TaskInfo;
use crate::result::TaskResult;
use crate::types::Backoff;

/// Task body: `(context, token) -> TaskResult`.
pub type TaskFn<C> =
    Arc<dyn Fn(Arc<C>, CancellationToken) -> BoxFuture<'static, anyhow::Result<TaskResult>> + Send + Sync>;

/// Predicate consulted before retrying a failure, given the failure's error.
pub type RetryPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Gate evaluated once, just before a task would start.
pub enum Condition<C> {
    Sync(Arc<dyn Fn(&C) -> anyhow::Result<bool> + Send + Sync>),
    Async(Arc<dyn Fn(Arc<C>) -> BoxFuture<'static, anyhow::Result<bool>> + Send + Sync>),
}

impl<C> Clone for Condition<C> {
    fn clone(&self) -> Self {
        match self {
            Condition::Sync(f) => Condition::Sync(Arc::clone(f)),
            Condition::Async(f) => Condition::Async(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for Condition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Sync(_) => f.write_str("Condition::Sync(..)"),
            Condition::Async(_) => f.write_str("Condition::Async(..)"),
        }
    }
}

/// Retry configuration for a task.
///
/// `attempts` counts retries, so a policy with `attempts = 2` runs the body at
/// most three times.
#[derive(Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
    pub should_retry: Option<RetryPredicate>,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            backoff: Backoff::Fixed,
            should_retry: None,
        }
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn exponential(self) -> Self {
        self.backoff(Backoff::Exponential)
    }

    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("should_retry", &self.should_retry.is_some())
            .finish()
    }
}

/// A named unit of work with dependencies.
pub struct Task<C> {
    pub name: String,
    pub dependencies: Vec<String>,
    pub priority: i32,
    pub retry: Option<RetryPolicy>,
    pub timeout: Option<Duration>,
    pub continue_on_error: bool,
    pub condition: Option<Condition<C>>,
    run: TaskFn<C>,
}

impl<C: Send + Sync + 'static> Task<C> {
    pub fn new<F, Fut>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Arc<C>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<TaskResult>> + Send + 'static,
    {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            priority: 0,
            retry: None,
            timeout: None,
            continue_on_error: false,
            condition: None,
            run: Arc::new(move |ctx: Arc<C>, token: CancellationToken| run(ctx, token).boxed()),
        }
    }

    /// Gate the task on a synchronous predicate over the context.
    pub fn condition<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.condition = Some(Condition::Sync(Arc::new(predicate)));
        self
    }

    /// Gate the task on an asynchronous predicate over the context.
    pub fn async_condition<F, Fut>(mut self, predicate: F) -> Self
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.condition = Some(Condition::Async(Arc::new(move |ctx: Arc<C>| {
            predicate(ctx).boxed()
        })));
        self
    }
}

impl<C> Task<C> {
    /// Add a dependency.
    pub fn after(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn continue_on_error(mut self, value: bool) -> Self {
        self.continue_on_error = value;
        self
    }

    /// Invoke the task body.
    pub fn invoke(
        &self,
        context: Arc<C>,
        token: CancellationToken,
    ) -> BoxFuture<'static, anyhow::Result<TaskResult>> {
        (self.run)(context, token)
    }

    /// Read-only snapshot used in lifecycle events.
    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            name: self.name.clone(),
            dependencies: self.dependencies.clone(),
            priority: self.priority,
            continue_on_error: self.continue_on_error,
        }
    }
}

impl<C> Clone for Task<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            dependencies: self.dependencies.clone(),
            priority: self.priority,
            retry: self.retry.clone(),
            timeout: self.timeout,
            continue_on_error: self.continue_on_error,
            condition: self.condition.clone(),
            run: Arc::clone(&self.run),
        }
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("priority", &self.priority)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .field("continue_on_error", &self.continue_on_error)
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}
