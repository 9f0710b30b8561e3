// src/engine/executor.rs

//! Workflow executor: validates a task list and drives it to completion.
//!
//! Tasks of one run are polled as futures inside the executor's own future
//! via `FuturesUnordered`. The executor owns the run's [`StateManager`],
//! the ready queue and the in-flight set; strategies only ever see one task.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::cancel::{CancelReason, CancellationToken};
use crate::config::RunConfig;
use crate::dag::{validate, StateManager};
use crate::engine::notifier::{EventNotifier, WorkflowEvent};
use crate::engine::plugin::Plugin;
use crate::engine::queue::PriorityQueue;
use crate::errors::{DagrunError, Result};
use crate::exec::{DryRunStrategy, ExecutionStrategy, RetryStrategy, StandardStrategy};
use crate::result::{RunSummary, TaskMetrics, TaskResult};
use crate::task::Task;
use crate::types::TaskStatus;

type Settled<C> = (Arc<Task<C>>, TaskResult);

/// Runs task graphs.
///
/// One executor can run any number of workflows, sequentially or
/// concurrently; each `execute` call owns its own state. Plugins are
/// installed once, on the first call.
pub struct WorkflowExecutor<C>
where
    C: Send + Sync + 'static,
{
    strategy: Arc<dyn ExecutionStrategy<C>>,
    notifier: EventNotifier,
    plugins: Vec<Arc<dyn Plugin>>,
    installed_plugins: Mutex<usize>,
    run_counter: AtomicU64,
}

impl<C> WorkflowExecutor<C>
where
    C: Send + Sync + 'static,
{
    /// Executor with the default strategy chain (retry around standard).
    pub fn new() -> Self {
        Self {
            strategy: Arc::new(RetryStrategy::new(StandardStrategy)),
            notifier: EventNotifier::new(),
            plugins: Vec::new(),
            installed_plugins: Mutex::new(0),
            run_counter: AtomicU64::new(0),
        }
    }

    pub fn with_strategy<S>(mut self, strategy: S) -> Self
    where
        S: ExecutionStrategy<C> + 'static,
    {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Share a notifier with other components (or other executors).
    pub fn with_notifier(mut self, notifier: EventNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_plugin<P>(mut self, plugin: P) -> Self
    where
        P: Plugin + 'static,
    {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn add_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn notifier(&self) -> &EventNotifier {
        &self.notifier
    }

    /// Run `tasks` against `context`.
    ///
    /// Returns `Err` only for an invalid graph or a plugin that fails to
    /// install; every per-task outcome is reported in the returned map, which
    /// holds exactly one entry per task.
    pub async fn execute(
        &self,
        tasks: &[Task<C>],
        context: Arc<C>,
        config: RunConfig,
    ) -> Result<HashMap<String, TaskResult>> {
        self.install_plugins()?;

        let run_id = self.run_counter.fetch_add(1, Ordering::Relaxed) + 1;

        let validation = validate(tasks);
        if !validation.is_valid {
            warn!(
                run_id,
                errors = validation.errors.len(),
                "workflow rejected by validation"
            );
            return Err(DagrunError::validation(validation));
        }

        let token = match &config.cancel {
            Some(external) => external.child_token(),
            None => CancellationToken::new(),
        };
        let limit = config.concurrency.map(|n| n.max(1)).unwrap_or(usize::MAX);
        let strategy: &dyn ExecutionStrategy<C> = if config.dry_run {
            &DryRunStrategy
        } else {
            self.strategy.as_ref()
        };

        let mut state = StateManager::new(run_id, self.notifier.clone());
        state.initialize(tasks);

        info!(
            run_id,
            tasks = tasks.len(),
            concurrency = ?config.concurrency,
            timeout = ?config.timeout,
            dry_run = config.dry_run,
            "workflow started"
        );
        self.notifier.emit(WorkflowEvent::WorkflowStart {
            run_id,
            tasks: tasks.iter().map(Task::info).collect(),
        });

        if token.is_cancelled() {
            let cancelled = state.cancel_all_pending("Workflow cancelled before start");
            warn!(run_id, cancelled, "token already cancelled; nothing executed");
        } else {
            drive(
                &mut state,
                strategy,
                &context,
                &token,
                limit,
                config.timeout,
            )
            .await;
        }

        if state.has_pending_tasks() {
            let stalled = state.cancel_all_pending("Workflow stalled: dependencies can never resolve");
            warn!(run_id, stalled, "workflow stalled; unresolved tasks cancelled");
        }

        let results = state.into_results();
        let summary = RunSummary::from_results(&results);
        info!(
            run_id,
            total = summary.total,
            success = summary.success,
            failure = summary.failure,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "workflow finished"
        );

        self.notifier.emit(WorkflowEvent::WorkflowEnd {
            run_id,
            results: results.clone(),
        });

        Ok(results)
    }

    fn install_plugins(&self) -> Result<()> {
        let mut installed = self
            .installed_plugins
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        while let Some(plugin) = self.plugins.get(*installed) {
            debug!(plugin = plugin.name(), "installing plugin");
            plugin
                .install(&self.notifier)
                .map_err(|e| e.context(format!("failed to install plugin '{}'", plugin.name())))?;
            *installed += 1;
        }

        Ok(())
    }
}

impl<C> Default for WorkflowExecutor<C>
where
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for WorkflowExecutor<C>
where
    C: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("WorkflowExecutor")
            .field("notifier", &self.notifier)
            .field("plugins", &plugins)
            .field("runs", &self.run_counter.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Main scheduling loop for one run.
///
/// Returns once nothing is in flight and nothing more can be launched.
async fn drive<C>(
    state: &mut StateManager<C>,
    strategy: &dyn ExecutionStrategy<C>,
    context: &Arc<C>,
    token: &CancellationToken,
    limit: usize,
    timeout: Option<Duration>,
) where
    C: Send + Sync + 'static,
{
    let mut queue: PriorityQueue<Arc<Task<C>>> = PriorityQueue::new();
    let mut in_flight: FuturesUnordered<BoxFuture<'_, Settled<C>>> = FuturesUnordered::new();
    let mut stopped = false;

    let timer = tokio::time::sleep(timeout.unwrap_or_default());
    tokio::pin!(timer);
    let mut timer_armed = timeout.is_some();

    let mut ready = state.process_dependencies(None);

    loop {
        for task in ready.drain(..) {
            let priority = task.priority;
            queue.push(task, priority);
        }

        if !stopped && token.is_cancelled() {
            stopped = true;
            stop(state, &mut queue, token);
        }

        if !stopped {
            while in_flight.len() < limit {
                let Some(task) = queue.pop() else {
                    break;
                };
                state.mark_running(&task);
                in_flight.push(launch(strategy, task, Arc::clone(context), token.clone()));
            }
        }

        if in_flight.is_empty() {
            break;
        }

        tokio::select! {
            settled = in_flight.next() => {
                let Some((task, result)) = settled else {
                    break;
                };
                settle(state, &task, result);
                if !stopped {
                    ready = state.process_dependencies(Some(&task.name));
                }
            }
            _ = token.cancelled(), if !stopped => {}
            _ = &mut timer, if timer_armed => {
                timer_armed = false;
                let limit = timeout.unwrap_or_default();
                warn!(timeout = ?limit, "workflow timeout reached");
                token.cancel_with(CancelReason::Timeout(limit));
            }
        }
    }
}

/// Cancel everything that has not started yet.
fn stop<C>(state: &mut StateManager<C>, queue: &mut PriorityQueue<Arc<Task<C>>>, token: &CancellationToken) {
    let message = match token.reason() {
        Some(CancelReason::Timeout(limit)) => {
            format!("Workflow timed out after {}ms", limit.as_millis())
        }
        _ => "Workflow cancelled".to_string(),
    };

    let queued = queue.drain();
    let dequeued = queued.len();
    for task in queued {
        state.mark_completed(&task, TaskResult::cancelled(message.as_str()));
    }
    let pending = state.cancel_all_pending(&message);

    warn!(
        queued = dequeued,
        pending,
        running_left = state.has_running_tasks(),
        "{message}; not-yet-started tasks cancelled"
    );
}

fn settle<C>(state: &mut StateManager<C>, task: &Task<C>, result: TaskResult) {
    debug!(task = %task.name, status = %result.status, "task settled");
    if result.status == TaskStatus::Skipped {
        state.mark_skipped(task, result);
    } else {
        state.mark_completed(task, result);
    }
}

/// Run one task through `strategy`, stamping timing metrics on the result.
fn launch<'a, C>(
    strategy: &'a dyn ExecutionStrategy<C>,
    task: Arc<Task<C>>,
    context: Arc<C>,
    token: CancellationToken,
) -> BoxFuture<'a, Settled<C>>
where
    C: Send + Sync + 'static,
{
    async move {
        let start_time = SystemTime::now();
        let started = Instant::now();

        let result = strategy.execute(&task, context, token).await;

        let metrics = TaskMetrics {
            start_time,
            end_time: SystemTime::now(),
            duration: started.elapsed(),
        };
        (task, result.with_metrics(metrics))
    }
    .boxed()
}
