// src/dag/state_manager.rs

//! Per-run state management for tasks.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dag::DagGraph;
use crate::engine::notifier::{EventNotifier, WorkflowEvent};
use crate::result::{TaskMetrics, TaskResult};
use crate::task::Task;
use crate::types::TaskStatus;

/// Outcome of checking one task's dependencies.
enum Readiness {
    /// Every dependency resolved and satisfying.
    Ready,
    /// At least one dependency has not resolved yet.
    Waiting,
    /// A dependency failed outright, or was skipped or cancelled.
    Blocked {
        dependency: String,
        status: TaskStatus,
        error: Option<String>,
    },
}

/// Owns the mutable state of exactly one workflow run.
///
/// - `pending`: not yet resolved and not yet handed out as ready.
/// - `running`: handed to a strategy and not yet settled.
/// - `results`: terminal result per task, written once.
///
/// The reverse-dependency index lives in [`DagGraph`] and is built once in
/// [`initialize`](Self::initialize).
pub struct StateManager<C> {
    run_id: u64,
    notifier: EventNotifier,
    graph: DagGraph,
    tasks: HashMap<String, Arc<Task<C>>>,
    pending: HashSet<String>,
    running: HashSet<String>,
    results: HashMap<String, TaskResult>,
}

impl<C> StateManager<C> {
    pub fn new(run_id: u64, notifier: EventNotifier) -> Self {
        Self {
            run_id,
            notifier,
            graph: DagGraph::default(),
            tasks: HashMap::new(),
            pending: HashSet::new(),
            running: HashSet::new(),
            results: HashMap::new(),
        }
    }

    /// Reset all state and seed `pending` with every task.
    pub fn initialize(&mut self, tasks: &[Task<C>]) {
        self.graph = DagGraph::from_tasks(tasks);
        self.tasks = tasks
            .iter()
            .map(|t| (t.name.clone(), Arc::new(t.clone())))
            .collect();
        self.pending = self.tasks.keys().cloned().collect();
        self.running.clear();
        self.results.clear();

        debug!(run_id = self.run_id, tasks = self.tasks.len(), "state initialised");
    }

    /// Recompute readiness.
    ///
    /// With a `trigger`, only that task's dependents are examined; without
    /// one, every pending task is (in declaration order). Tasks blocked by a
    /// failed, skipped or cancelled dependency are skipped on the spot and
    /// their own dependents are examined in the same pass, so a whole
    /// unresolved subtree is skipped before this returns.
    ///
    /// Returned tasks are removed from `pending`.
    pub fn process_dependencies(&mut self, trigger: Option<&str>) -> Vec<Arc<Task<C>>> {
        let mut queue: VecDeque<String> = match trigger {
            Some(name) => self.graph.dependents_of(name).iter().cloned().collect(),
            None => self
                .graph
                .tasks()
                .filter(|name| self.pending.contains(*name))
                .map(str::to_string)
                .collect(),
        };

        let mut ready = Vec::new();

        while let Some(name) = queue.pop_front() {
            if !self.pending.contains(&name) {
                continue;
            }
            let Some(task) = self.tasks.get(&name).cloned() else {
                warn!(task = %name, "node in DAG not present in tasks map");
                continue;
            };

            match self.readiness(&task) {
                Readiness::Waiting => {}
                Readiness::Ready => {
                    self.pending.remove(&name);
                    debug!(run_id = self.run_id, task = %name, "dependencies satisfied; ready");
                    ready.push(task);
                }
                Readiness::Blocked {
                    dependency,
                    status,
                    error,
                } => {
                    let message = match (status, error) {
                        (TaskStatus::Failure, Some(err)) => {
                            format!("Skipped because dependency '{dependency}' failed: {err}")
                        }
                        (TaskStatus::Failure, None) => {
                            format!("Skipped because dependency '{dependency}' failed")
                        }
                        (other, _) => {
                            format!("Skipped because dependency '{dependency}' was {other}")
                        }
                    };
                    debug!(
                        run_id = self.run_id,
                        task = %name,
                        dependency = %dependency,
                        "skipping task due to upstream result"
                    );
                    self.mark_skipped(&task, TaskResult::skipped(message));
                    queue.extend(self.graph.dependents_of(&name).iter().cloned());
                }
            }
        }

        ready
    }

    fn readiness(&self, task: &Task<C>) -> Readiness {
        let mut waiting = false;

        for dep_name in &task.dependencies {
            let Some(result) = self.results.get(dep_name) else {
                waiting = true;
                continue;
            };

            let tolerated = self
                .tasks
                .get(dep_name)
                .is_some_and(|dep| dep.continue_on_error);

            match result.status {
                TaskStatus::Success => {}
                TaskStatus::Failure if tolerated => {}
                status => {
                    return Readiness::Blocked {
                        dependency: dep_name.clone(),
                        status,
                        error: result.error.clone(),
                    };
                }
            }
        }

        if waiting {
            Readiness::Waiting
        } else {
            Readiness::Ready
        }
    }

    pub fn mark_running(&mut self, task: &Task<C>) {
        self.running.insert(task.name.clone());
        debug!(run_id = self.run_id, task = %task.name, "marked Running");
        self.notifier.emit(WorkflowEvent::TaskStart {
            run_id: self.run_id,
            task: task.info(),
        });
    }

    /// Record a terminal result for a task that ran (or was dequeued).
    ///
    /// A second result for the same task is ignored.
    pub fn mark_completed(&mut self, task: &Task<C>, result: TaskResult) {
        self.running.remove(&task.name);
        self.pending.remove(&task.name);

        if self.results.contains_key(&task.name) {
            warn!(
                run_id = self.run_id,
                task = %task.name,
                "task already has a result; ignoring duplicate completion"
            );
            return;
        }

        debug!(run_id = self.run_id, task = %task.name, status = %result.status, "marked completed");
        let result = with_metrics(result);
        self.results.insert(task.name.clone(), result.clone());
        self.notifier.emit(WorkflowEvent::TaskEnd {
            run_id: self.run_id,
            task: task.info(),
            result,
        });
    }

    /// Record a skip. Idempotent: an already-resolved task is left untouched.
    pub fn mark_skipped(&mut self, task: &Task<C>, result: TaskResult) {
        if self.results.contains_key(&task.name) {
            return;
        }
        self.running.remove(&task.name);
        self.pending.remove(&task.name);

        let result = with_metrics(result);
        self.results.insert(task.name.clone(), result.clone());
        self.notifier.emit(WorkflowEvent::TaskSkipped {
            run_id: self.run_id,
            task: task.info(),
            result,
        });
    }

    /// Force every pending task to `Cancelled`. Returns how many were
    /// cancelled. Running tasks are left alone.
    pub fn cancel_all_pending(&mut self, message: &str) -> usize {
        let names: Vec<String> = self
            .graph
            .tasks()
            .filter(|name| self.pending.contains(*name))
            .map(str::to_string)
            .collect();

        for name in &names {
            if let Some(task) = self.tasks.get(name).cloned() {
                self.mark_completed(&task, TaskResult::cancelled(message));
            }
        }

        if !names.is_empty() {
            debug!(run_id = self.run_id, cancelled = names.len(), "cancelled pending tasks");
        }
        names.len()
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn has_running_tasks(&self) -> bool {
        !self.running.is_empty()
    }

    pub fn is_pending(&self, task: &str) -> bool {
        self.pending.contains(task)
    }

    pub fn is_running(&self, task: &str) -> bool {
        self.running.contains(task)
    }

    pub fn result_of(&self, task: &str) -> Option<&TaskResult> {
        self.results.get(task)
    }

    pub fn results(&self) -> &HashMap<String, TaskResult> {
        &self.results
    }

    pub fn into_results(self) -> HashMap<String, TaskResult> {
        self.results
    }
}

fn with_metrics(result: TaskResult) -> TaskResult {
    if result.metrics.is_some() {
        result
    } else {
        result.with_metrics(TaskMetrics::instant())
    }
}
