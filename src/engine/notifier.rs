// src/engine/notifier.rs

//! Lifecycle event publish/subscribe.
//!
//! Emission never blocks and never fails: each listener invocation is spawned
//! as its own Tokio task, and errors or panics inside a listener are caught
//! and logged here. Nothing a listener does can reach the scheduler.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::dag::TaskInfo;
use crate::result::TaskResult;

/// Kinds of lifecycle events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WorkflowStart,
    WorkflowEnd,
    TaskStart,
    TaskEnd,
    TaskSkipped,
}

/// Lifecycle event, carrying snapshots only.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    WorkflowStart {
        run_id: u64,
        tasks: Vec<TaskInfo>,
    },
    WorkflowEnd {
        run_id: u64,
        results: HashMap<String, TaskResult>,
    },
    TaskStart {
        run_id: u64,
        task: TaskInfo,
    },
    TaskEnd {
        run_id: u64,
        task: TaskInfo,
        result: TaskResult,
    },
    TaskSkipped {
        run_id: u64,
        task: TaskInfo,
        result: TaskResult,
    },
}

impl WorkflowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkflowEvent::WorkflowStart { .. } => EventKind::WorkflowStart,
            WorkflowEvent::WorkflowEnd { .. } => EventKind::WorkflowEnd,
            WorkflowEvent::TaskStart { .. } => EventKind::TaskStart,
            WorkflowEvent::TaskEnd { .. } => EventKind::TaskEnd,
            WorkflowEvent::TaskSkipped { .. } => EventKind::TaskSkipped,
        }
    }

    pub fn run_id(&self) -> u64 {
        match self {
            WorkflowEvent::WorkflowStart { run_id, .. }
            | WorkflowEvent::WorkflowEnd { run_id, .. }
            | WorkflowEvent::TaskStart { run_id, .. }
            | WorkflowEvent::TaskEnd { run_id, .. }
            | WorkflowEvent::TaskSkipped { run_id, .. } => *run_id,
        }
    }

    /// Name of the task this event is about, if any.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            WorkflowEvent::TaskStart { task, .. }
            | WorkflowEvent::TaskEnd { task, .. }
            | WorkflowEvent::TaskSkipped { task, .. } => Some(task.name.as_str()),
            _ => None,
        }
    }
}

type Callback = Arc<dyn Fn(Arc<WorkflowEvent>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A registered callback.
///
/// Identity is by allocation: subscribing the same `Listener` (or a clone of
/// it) twice to one event kind registers it once.
#[derive(Clone)]
pub struct Listener {
    callback: Callback,
}

impl Listener {
    /// Wrap a synchronous callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&WorkflowEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(move |event: Arc<WorkflowEvent>| {
                let res = f(event.as_ref());
                async move { res }.boxed()
            }),
        }
    }

    /// Wrap an asynchronous callback.
    pub fn new_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<WorkflowEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            callback: Arc::new(move |event: Arc<WorkflowEvent>| f(event).boxed()),
        }
    }

    fn same_as(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").finish_non_exhaustive()
    }
}

/// Cheaply clonable handle to a shared listener registry.
#[derive(Clone, Default)]
pub struct EventNotifier {
    listeners: Arc<Mutex<HashMap<EventKind, Vec<Listener>>>>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kind`. Returns `false` if it was already
    /// registered for that kind.
    pub fn subscribe(&self, kind: EventKind, listener: &Listener) -> bool {
        let mut map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = map.entry(kind).or_default();
        if entries.iter().any(|l| l.same_as(listener)) {
            return false;
        }
        entries.push(listener.clone());
        true
    }

    /// Remove `listener` from `kind`. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, kind: EventKind, listener: &Listener) -> bool {
        let mut map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = map.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|l| !l.same_as(listener));
        before != entries.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        let map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// Dispatch `event` to every listener of its kind without waiting.
    ///
    /// Requires a Tokio runtime; outside one the event is dropped with a
    /// warning.
    pub fn emit(&self, event: WorkflowEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = {
            let map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            map.get(&kind).cloned().unwrap_or_default()
        };

        if listeners.is_empty() {
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(e) => {
                warn!(event = ?kind, error = %e, "no tokio runtime; dropping event");
                return;
            }
        };

        debug!(event = ?kind, listeners = listeners.len(), "emitting event");

        let event = Arc::new(event);
        for listener in listeners {
            handle.spawn(dispatch(listener, Arc::clone(&event)));
        }
    }
}

impl fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&EventKind, usize> = map.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventNotifier")
            .field("listeners", &counts)
            .finish()
    }
}

async fn dispatch(listener: Listener, event: Arc<WorkflowEvent>) {
    let kind = event.kind();
    let outcome = AssertUnwindSafe(async move { (listener.callback)(event).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(event = ?kind, error = %e, "event listener failed");
        }
        Err(_) => {
            warn!(event = ?kind, "event listener panicked");
        }
    }
}
