#![allow(dead_code)]

//! Task fixtures shared by the integration tests.
//!
//! Most fixtures append to a shared [`Log`] so a test can assert on what ran
//! and in which order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use dagrun::{CancellationToken, Task, TaskResult};

/// Shared, ordered record of task activity.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of everything recorded so far.
pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn record(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

/// Succeeds immediately.
pub fn ok_task<C>(name: &str) -> Task<C>
where
    C: Send + Sync + 'static,
{
    Task::new(name, |_ctx: Arc<C>, _token: CancellationToken| async {
        anyhow::Ok(TaskResult::success())
    })
}

/// Returns `Err(message)` from its body.
pub fn failing_task<C>(name: &str, message: &str) -> Task<C>
where
    C: Send + Sync + 'static,
{
    let message = message.to_string();
    Task::new(name, move |_ctx: Arc<C>, _token: CancellationToken| {
        let message = message.clone();
        async move { Err::<TaskResult, _>(anyhow!(message)) }
    })
}

/// Records its own name, then succeeds.
pub fn recording_task<C>(name: &str, log: &Log) -> Task<C>
where
    C: Send + Sync + 'static,
{
    let log = Arc::clone(log);
    let own = name.to_string();
    Task::new(name, move |_ctx: Arc<C>, _token: CancellationToken| {
        let log = Arc::clone(&log);
        let own = own.clone();
        async move {
            record(&log, own);
            anyhow::Ok(TaskResult::success())
        }
    })
}

/// Records `start:<name>`, sleeps for `delay`, records `end:<name>`.
///
/// Ignores cancellation, so it always runs to completion.
pub fn sleepy_task<C>(name: &str, delay: Duration, log: &Log) -> Task<C>
where
    C: Send + Sync + 'static,
{
    let log = Arc::clone(log);
    let own = name.to_string();
    Task::new(name, move |_ctx: Arc<C>, _token: CancellationToken| {
        let log = Arc::clone(&log);
        let own = own.clone();
        async move {
            record(&log, format!("start:{own}"));
            tokio::time::sleep(delay).await;
            record(&log, format!("end:{own}"));
            anyhow::Ok(TaskResult::success())
        }
    })
}

/// Waits until the run is cancelled, then fails with "stopped".
pub fn until_cancelled_task<C>(name: &str, log: &Log) -> Task<C>
where
    C: Send + Sync + 'static,
{
    let log = Arc::clone(log);
    let own = name.to_string();
    Task::new(name, move |_ctx: Arc<C>, token: CancellationToken| {
        let log = Arc::clone(&log);
        let own = own.clone();
        async move {
            record(&log, format!("start:{own}"));
            token.cancelled().await;
            record(&log, format!("stopped:{own}"));
            Err::<TaskResult, _>(anyhow!("stopped"))
        }
    })
}

/// Fails the first `failures` calls, then succeeds. Every call bumps
/// `calls`.
pub fn flaky_task<C>(name: &str, failures: usize, calls: &Arc<AtomicUsize>) -> Task<C>
where
    C: Send + Sync + 'static,
{
    let calls = Arc::clone(calls);
    Task::new(name, move |_ctx: Arc<C>, _token: CancellationToken| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if n <= failures {
                Err(anyhow!("attempt {n} failed"))
            } else {
                Ok(TaskResult::success().with_message(format!("succeeded on attempt {n}")))
            }
        }
    })
}
