// src/dag/task_info.rs

//! Read-only task snapshots.

use serde::Serialize;

/// Snapshot of a task's static shape, carried by lifecycle events so that
/// observers never need access to the task body or the shared context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInfo {
    pub name: String,
    /// Direct dependencies, in declaration order.
    pub dependencies: Vec<String>,
    pub priority: i32,
    pub continue_on_error: bool,
}
