mod common;
use crate::common::builders::ok_task;

use std::sync::Arc;

use dagrun::dag::{validate, ValidationDetails, ValidationErrorKind};
use dagrun::{DagrunError, RunConfig, Task, WorkflowExecutor};
use dagrun_test_utils::fake_strategy::RecordingStrategy;

#[test]
fn test_valid_graph_has_no_errors() {
    let tasks: Vec<Task<()>> = vec![
        ok_task("a"),
        ok_task("b").after("a"),
        ok_task("c").after("a").after("b"),
    ];

    let result = validate(&tasks);
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
}

#[test]
fn test_empty_task_list_is_valid() {
    let tasks: Vec<Task<()>> = Vec::new();
    assert!(validate(&tasks).is_valid);
}

#[test]
fn test_cycle_path_is_reconstructed() {
    let tasks: Vec<Task<()>> = vec![
        ok_task("A").after("B"),
        ok_task("B").after("C"),
        ok_task("C").after("A"),
    ];

    let result = validate(&tasks);
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);

    let err = &result.errors[0];
    assert_eq!(err.kind, ValidationErrorKind::Cycle);
    assert_eq!(err.message, "Circular dependency detected: A -> B -> C -> A");
    match &err.details {
        ValidationDetails::Cycle { path } => {
            assert_eq!(path, &["A", "B", "C", "A"]);
        }
        other => panic!("Expected cycle details, got: {:?}", other),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let tasks: Vec<Task<()>> = vec![ok_task("loop").after("loop")];

    let result = validate(&tasks);
    let cycles: Vec<_> = result.errors_of(ValidationErrorKind::Cycle).collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].message, "Circular dependency detected: loop -> loop");
}

#[test]
fn test_cycle_reported_from_the_repeated_node() {
    // entry -> x -> y -> x: the path starts at the node reached twice.
    let tasks: Vec<Task<()>> = vec![
        ok_task("entry").after("x"),
        ok_task("x").after("y"),
        ok_task("y").after("x"),
    ];

    let result = validate(&tasks);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].message,
        "Circular dependency detected: x -> y -> x"
    );
}

#[test]
fn test_missing_dependency_skips_cycle_detection() {
    let tasks: Vec<Task<()>> = vec![
        ok_task("a").after("ghost"),
        ok_task("b").after("c"),
        ok_task("c").after("b"),
    ];

    let result = validate(&tasks);
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors_of(ValidationErrorKind::Cycle).count(), 0);

    let err = &result.errors[0];
    assert_eq!(err.kind, ValidationErrorKind::MissingDependency);
    assert_eq!(err.message, "Task 'a' depends on missing task 'ghost'");
    assert_eq!(
        err.details,
        ValidationDetails::MissingDependency {
            task: "a".to_string(),
            dependency: "ghost".to_string(),
        }
    );
}

#[test]
fn test_duplicate_names_reported_once_per_repeat() {
    let tasks: Vec<Task<()>> = vec![ok_task("a"), ok_task("a"), ok_task("a"), ok_task("b")];

    let result = validate(&tasks);
    let dups: Vec<_> = result.errors_of(ValidationErrorKind::DuplicateTask).collect();
    assert_eq!(dups.len(), 2);
    assert!(dups.iter().all(|e| e.message == "Duplicate task name: 'a'"));
}

#[test]
fn test_long_chain_does_not_overflow() {
    let mut tasks: Vec<Task<()>> = vec![ok_task("t0")];
    for i in 1..20_000 {
        tasks.push(ok_task(&format!("t{i}")).after(format!("t{}", i - 1)));
    }
    tasks[0] = ok_task("t0").after("t19999");

    let result = validate(&tasks);
    assert_eq!(result.errors_of(ValidationErrorKind::Cycle).count(), 1);
}

#[tokio::test]
async fn test_invalid_graph_runs_nothing() {
    let strategy = RecordingStrategy::new();
    let executor = WorkflowExecutor::new().with_strategy(strategy.clone());
    let tasks: Vec<Task<()>> = vec![ok_task("a").after("b"), ok_task("b").after("a")];

    let err = executor
        .execute(&tasks, Arc::new(()), RunConfig::default())
        .await
        .expect_err("cyclic graph must be rejected");

    match &err {
        DagrunError::Validation { message, result } => {
            assert!(message.contains("Circular dependency detected"));
            assert_eq!(result.errors.len(), 1);
        }
        other => panic!("Expected validation error, got: {:?}", other),
    }
    assert!(err.validation_result().is_some());
    assert!(strategy.executed().is_empty());
}

#[tokio::test]
async fn test_validation_error_joins_all_messages() {
    let tasks: Vec<Task<()>> = vec![ok_task("a"), ok_task("a").after("nope")];

    let err = dagrun::execute(&tasks, Arc::new(()), RunConfig::default())
        .await
        .expect_err("invalid graph must be rejected");

    let text = err.to_string();
    assert!(text.starts_with("Workflow validation failed: "));
    assert!(text.contains("Duplicate task name: 'a'; Task 'a' depends on missing task 'nope'"));
}
