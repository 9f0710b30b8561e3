#![allow(dead_code)]

use std::collections::HashMap;

use dagrun::{TaskResult, TaskStatus};

pub use dagrun_test_utils::builders;
pub use dagrun_test_utils::{init_tracing, with_timeout};

/// Status of `task` in a result map; panics if the task has no result.
pub fn status_of(results: &HashMap<String, TaskResult>, task: &str) -> TaskStatus {
    results
        .get(task)
        .unwrap_or_else(|| panic!("no result for task '{task}'"))
        .status
}

/// Position of `entry` in a recorded log.
pub fn position(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("'{entry}' not found in {log:?}"))
}
