// src/result.rs

//! Task results and run summaries.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::types::TaskStatus;

/// Timing of a single task execution, attached by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskMetrics {
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub duration: Duration,
}

impl TaskMetrics {
    /// Zero-length metrics for tasks resolved without running.
    pub fn instant() -> Self {
        let now = SystemTime::now();
        Self {
            start_time: now,
            end_time: now,
            duration: Duration::ZERO,
        }
    }
}

/// Terminal result of one task.
///
/// Task bodies return this too; whatever they put in `metrics` is replaced by
/// the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub status: TaskStatus,
    pub message: Option<String>,
    /// Failure cause. Present when `status` is `Failure`.
    pub error: Option<String>,
    pub data: Option<serde_json::Value>,
    pub metrics: Option<TaskMetrics>,
}

impl TaskResult {
    fn with_status(status: TaskStatus) -> Self {
        Self {
            status,
            message: None,
            error: None,
            data: None,
            metrics: None,
        }
    }

    pub fn success() -> Self {
        Self::with_status(TaskStatus::Success)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            message: Some(error.clone()),
            error: Some(error),
            ..Self::with_status(TaskStatus::Failure)
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self::with_status(TaskStatus::Skipped).with_message(message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::with_status(TaskStatus::Cancelled).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_metrics(mut self, metrics: TaskMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }

    /// Message and error joined, for matching in logs and tests.
    pub fn describe(&self) -> String {
        match (&self.message, &self.error) {
            (Some(m), Some(e)) if m != e => format!("{m}: {e}"),
            (Some(m), _) => m.clone(),
            (None, Some(e)) => e.clone(),
            (None, None) => self.status.to_string(),
        }
    }
}

/// Per-status counts over a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl RunSummary {
    pub fn from_results(results: &HashMap<String, TaskResult>) -> Self {
        let mut summary = RunSummary {
            total: results.len(),
            ..Default::default()
        };
        for result in results.values() {
            match result.status {
                TaskStatus::Success => summary.success += 1,
                TaskStatus::Failure => summary.failure += 1,
                TaskStatus::Skipped => summary.skipped += 1,
                TaskStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }

    /// True when every task succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.success == self.total
    }
}
