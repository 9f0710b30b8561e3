mod common;
use crate::common::builders::{failing_task, ok_task};
use crate::common::with_timeout;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use dagrun::{
    EventKind, EventNotifier, Listener, Plugin, RunConfig, Task, TaskStatus, WorkflowEvent,
    WorkflowExecutor,
};
use tokio::sync::mpsc;

/// Listener that forwards every event it sees into a channel.
fn forwarding_listener() -> (Listener, mpsc::UnboundedReceiver<WorkflowEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = Listener::new(move |event: &WorkflowEvent| {
        let _ = tx.send(event.clone());
        Ok(())
    });
    (listener, rx)
}

async fn collect(rx: &mut mpsc::UnboundedReceiver<WorkflowEvent>, n: usize) -> Vec<WorkflowEvent> {
    let mut events = Vec::with_capacity(n);
    while events.len() < n {
        let event = with_timeout(rx.recv()).await.expect("channel closed");
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_lifecycle_events_are_emitted() {
    let executor: WorkflowExecutor<()> = WorkflowExecutor::new();
    let (listener, mut rx) = forwarding_listener();
    for kind in [
        EventKind::WorkflowStart,
        EventKind::TaskStart,
        EventKind::TaskEnd,
        EventKind::TaskSkipped,
        EventKind::WorkflowEnd,
    ] {
        assert!(executor.notifier().subscribe(kind, &listener));
    }

    let tasks: Vec<Task<()>> = vec![failing_task("a", "bad"), ok_task("b").after("a")];
    executor
        .execute(&tasks, Arc::new(()), RunConfig::default())
        .await
        .unwrap();

    // start + TaskStart(a) + TaskEnd(a) + TaskSkipped(b) + end
    let events = collect(&mut rx, 5).await;
    let count = |kind: EventKind| events.iter().filter(|e| e.kind() == kind).count();
    assert_eq!(count(EventKind::WorkflowStart), 1);
    assert_eq!(count(EventKind::TaskStart), 1);
    assert_eq!(count(EventKind::TaskEnd), 1);
    assert_eq!(count(EventKind::TaskSkipped), 1);
    assert_eq!(count(EventKind::WorkflowEnd), 1);

    let run_id = events[0].run_id();
    assert!(events.iter().all(|e| e.run_id() == run_id));

    for event in &events {
        match event {
            WorkflowEvent::WorkflowStart { tasks, .. } => {
                let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            WorkflowEvent::TaskSkipped { task, result, .. } => {
                assert_eq!(task.name, "b");
                assert_eq!(task.dependencies, vec!["a".to_string()]);
                assert_eq!(result.status, TaskStatus::Skipped);
            }
            WorkflowEvent::TaskEnd { task, result, .. } => {
                assert_eq!(task.name, "a");
                assert_eq!(result.status, TaskStatus::Failure);
            }
            WorkflowEvent::WorkflowEnd { results, .. } => {
                assert_eq!(results.len(), 2);
            }
            WorkflowEvent::TaskStart { task, .. } => {
                assert_eq!(event.task_name(), Some("a"));
                assert_eq!(task.name, "a");
            }
        }
    }
}

#[tokio::test]
async fn test_subscribe_is_idempotent() {
    let notifier = EventNotifier::new();
    let (listener, mut rx) = forwarding_listener();

    assert!(notifier.subscribe(EventKind::TaskStart, &listener));
    assert!(!notifier.subscribe(EventKind::TaskStart, &listener));
    assert!(!notifier.subscribe(EventKind::TaskStart, &listener.clone()));
    assert_eq!(notifier.listener_count(EventKind::TaskStart), 1);

    notifier.emit(WorkflowEvent::WorkflowEnd {
        run_id: 1,
        results: Default::default(),
    });
    notifier.emit(WorkflowEvent::TaskStart {
        run_id: 1,
        task: ok_task::<()>("x").info(),
    });

    let events = collect(&mut rx, 1).await;
    assert_eq!(events[0].kind(), EventKind::TaskStart);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx.try_recv().is_err(), "listener fired more than once");
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let notifier = EventNotifier::new();
    let (listener, mut rx) = forwarding_listener();

    assert!(!notifier.unsubscribe(EventKind::TaskEnd, &listener));
    notifier.subscribe(EventKind::TaskEnd, &listener);
    assert!(notifier.unsubscribe(EventKind::TaskEnd, &listener));
    assert!(!notifier.unsubscribe(EventKind::TaskEnd, &listener));
    assert_eq!(notifier.listener_count(EventKind::TaskEnd), 0);

    notifier.emit(WorkflowEvent::TaskEnd {
        run_id: 1,
        task: ok_task::<()>("x").info(),
        result: dagrun::TaskResult::success(),
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_failing_listeners_do_not_affect_run() {
    let executor: WorkflowExecutor<()> = WorkflowExecutor::new();
    let failing = Listener::new(|_: &WorkflowEvent| Err(anyhow!("listener broke")));
    let panicking = Listener::new(|_: &WorkflowEvent| panic!("listener exploded"));
    let (healthy, mut rx) = forwarding_listener();

    executor.notifier().subscribe(EventKind::TaskEnd, &failing);
    executor.notifier().subscribe(EventKind::TaskEnd, &panicking);
    executor.notifier().subscribe(EventKind::TaskEnd, &healthy);

    let tasks: Vec<Task<()>> = vec![ok_task("a"), ok_task("b").after("a")];
    let results = executor
        .execute(&tasks, Arc::new(()), RunConfig::default())
        .await
        .unwrap();

    assert_eq!(results["b"].status, TaskStatus::Success);
    let events = collect(&mut rx, 2).await;
    assert!(events.iter().all(|e| e.kind() == EventKind::TaskEnd));
}

#[tokio::test]
async fn test_async_listener_receives_events() {
    let notifier = EventNotifier::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
    let listener = Listener::new_async(move |event: Arc<WorkflowEvent>| {
        let tx = tx.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            tx.send(event.run_id())?;
            anyhow::Ok(())
        }
    });
    notifier.subscribe(EventKind::WorkflowStart, &listener);

    notifier.emit(WorkflowEvent::WorkflowStart {
        run_id: 42,
        tasks: Vec::new(),
    });

    assert_eq!(with_timeout(rx.recv()).await, Some(42));
}

struct CountingPlugin {
    installs: Arc<AtomicUsize>,
    ends: Arc<AtomicUsize>,
}

impl Plugin for CountingPlugin {
    fn name(&self) -> &str {
        "counting"
    }

    fn install(&self, notifier: &EventNotifier) -> anyhow::Result<()> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        let ends = Arc::clone(&self.ends);
        notifier.subscribe(
            EventKind::WorkflowEnd,
            &Listener::new(move |_: &WorkflowEvent| {
                ends.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        Ok(())
    }
}

#[tokio::test]
async fn test_plugins_install_once_per_executor() {
    let installs = Arc::new(AtomicUsize::new(0));
    let ends = Arc::new(AtomicUsize::new(0));
    let executor: WorkflowExecutor<()> = WorkflowExecutor::new().with_plugin(CountingPlugin {
        installs: Arc::clone(&installs),
        ends: Arc::clone(&ends),
    });

    assert_eq!(installs.load(Ordering::SeqCst), 0);

    let tasks: Vec<Task<()>> = vec![ok_task("a")];
    for _ in 0..3 {
        executor
            .execute(&tasks, Arc::new(()), RunConfig::default())
            .await
            .unwrap();
    }

    assert_eq!(installs.load(Ordering::SeqCst), 1);

    with_timeout(async {
        while ends.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

struct BrokenPlugin;

impl Plugin for BrokenPlugin {
    fn name(&self) -> &str {
        "broken"
    }

    fn install(&self, _notifier: &EventNotifier) -> anyhow::Result<()> {
        Err(anyhow!("missing credentials"))
    }
}

#[tokio::test]
async fn test_plugin_install_failure_aborts_before_running() {
    let ran = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&ran);
    let executor: WorkflowExecutor<()> = WorkflowExecutor::new().with_plugin(BrokenPlugin);
    let tasks: Vec<Task<()>> = vec![Task::new("a", move |_ctx: Arc<()>, _token| {
        *flag.lock().unwrap() = true;
        async { anyhow::Ok(dagrun::TaskResult::success()) }
    })];

    let err = executor
        .execute(&tasks, Arc::new(()), RunConfig::default())
        .await
        .expect_err("plugin failure must abort the run");

    let text = format!("{err:#}");
    assert!(text.contains("failed to install plugin 'broken'"), "{text}");
    assert!(text.contains("missing credentials"), "{text}");
    assert!(!*ran.lock().unwrap());
}
