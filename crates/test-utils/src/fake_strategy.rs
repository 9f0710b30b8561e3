use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dagrun::exec::ExecutionStrategy;
use dagrun::{CancellationToken, Task, TaskResult};
use futures::future::BoxFuture;
use futures::FutureExt;

/// A fake execution strategy that:
/// - records the name of every task it is asked to execute
/// - never invokes task bodies
/// - returns a scripted result per task name (success by default).
#[derive(Clone, Default)]
pub struct RecordingStrategy {
    executed: Arc<Mutex<Vec<String>>>,
    outcomes: HashMap<String, TaskResult>,
}

impl RecordingStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `result` whenever `task` is executed.
    pub fn with_outcome(mut self, task: &str, result: TaskResult) -> Self {
        self.outcomes.insert(task.to_string(), result);
        self
    }

    /// Task names in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl<C> ExecutionStrategy<C> for RecordingStrategy
where
    C: Send + Sync + 'static,
{
    fn execute<'a>(
        &'a self,
        task: &'a Task<C>,
        _context: Arc<C>,
        _token: CancellationToken,
    ) -> BoxFuture<'a, TaskResult> {
        self.executed.lock().unwrap().push(task.name.clone());
        let result = self
            .outcomes
            .get(&task.name)
            .cloned()
            .unwrap_or_else(TaskResult::success);
        async move { result }.boxed()
    }
}
