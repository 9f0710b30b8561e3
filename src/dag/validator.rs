// src/dag/validator.rs

//! Structural validation of a task list.
//!
//! Checks run in a fixed order:
//! 1. duplicate task names
//! 2. dependencies on undeclared tasks
//! 3. cycles (only when step 2 found nothing, since edges into missing nodes
//!    would produce meaningless cycle reports)
//!
//! Cycle detection is an iterative DFS over a petgraph `DiGraphMap`, so
//! arbitrarily long dependency chains cannot overflow the call stack.

use std::collections::{HashMap, HashSet};

use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use tracing::debug;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    Cycle,
    MissingDependency,
    DuplicateTask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationDetails {
    /// Ordered cycle path; the first node is repeated at the end.
    Cycle { path: Vec<String> },
    MissingDependency { task: String, dependency: String },
    DuplicateTask { task: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    pub details: ValidationDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn errors_of(&self, kind: ValidationErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

/// Validate a task list. `is_valid` is true iff `errors` is empty.
pub fn validate<C>(tasks: &[Task<C>]) -> ValidationResult {
    let mut errors = duplicate_errors(tasks);

    let missing = missing_dependency_errors(tasks);
    if !missing.is_empty() {
        errors.extend(missing);
        return ValidationResult::from_errors(errors);
    }

    if let Some(path) = find_cycle(tasks) {
        errors.push(ValidationError {
            kind: ValidationErrorKind::Cycle,
            message: format!("Circular dependency detected: {}", path.join(" -> ")),
            details: ValidationDetails::Cycle { path },
        });
    }

    debug!(tasks = tasks.len(), errors = errors.len(), "validated task graph");
    ValidationResult::from_errors(errors)
}

fn duplicate_errors<C>(tasks: &[Task<C>]) -> Vec<ValidationError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(tasks.len());
    let mut errors = Vec::new();

    for task in tasks {
        if !seen.insert(task.name.as_str()) {
            errors.push(ValidationError {
                kind: ValidationErrorKind::DuplicateTask,
                message: format!("Duplicate task name: '{}'", task.name),
                details: ValidationDetails::DuplicateTask {
                    task: task.name.clone(),
                },
            });
        }
    }

    errors
}

fn missing_dependency_errors<C>(tasks: &[Task<C>]) -> Vec<ValidationError> {
    let declared: HashSet<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    let mut errors = Vec::new();

    for task in tasks {
        for dep in &task.dependencies {
            if !declared.contains(dep.as_str()) {
                errors.push(ValidationError {
                    kind: ValidationErrorKind::MissingDependency,
                    message: format!(
                        "Task '{}' depends on missing task '{}'",
                        task.name, dep
                    ),
                    details: ValidationDetails::MissingDependency {
                        task: task.name.clone(),
                        dependency: dep.clone(),
                    },
                });
            }
        }
    }

    errors
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnPath,
    Done,
}

struct Frame<'a> {
    node: &'a str,
    neighbors: Vec<&'a str>,
    next: usize,
}

impl<'a> Frame<'a> {
    fn new(graph: &DiGraphMap<&'a str, ()>, node: &'a str) -> Self {
        Self {
            node,
            neighbors: graph.neighbors(node).collect(),
            next: 0,
        }
    }
}

/// Find the first cycle reachable by walking dependency edges, starting
/// from tasks in declaration order.
///
/// Returns the path from the revisited node back to itself, e.g.
/// `["A", "B", "C", "A"]`.
fn find_cycle<C>(tasks: &[Task<C>]) -> Option<Vec<String>> {
    // Edge direction: task -> dependency.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for task in tasks {
        graph.add_node(task.name.as_str());
    }
    for task in tasks {
        for dep in &task.dependencies {
            graph.add_edge(task.name.as_str(), dep.as_str(), ());
        }
    }

    let mut visits: HashMap<&str, Visit> = HashMap::with_capacity(tasks.len());

    for task in tasks {
        let start = task.name.as_str();
        if visits.contains_key(start) {
            continue;
        }

        visits.insert(start, Visit::OnPath);
        let mut stack = vec![Frame::new(&graph, start)];

        loop {
            let next = match stack.last_mut() {
                None => break,
                Some(frame) if frame.next < frame.neighbors.len() => {
                    frame.next += 1;
                    Some(frame.neighbors[frame.next - 1])
                }
                Some(_) => None,
            };

            match next {
                None => {
                    if let Some(frame) = stack.pop() {
                        visits.insert(frame.node, Visit::Done);
                    }
                }
                Some(node) => match visits.get(node) {
                    Some(Visit::Done) => {}
                    Some(Visit::OnPath) => {
                        let pos = stack.iter().position(|f| f.node == node)?;
                        let mut path: Vec<String> =
                            stack[pos..].iter().map(|f| f.node.to_string()).collect();
                        path.push(node.to_string());
                        return Some(path);
                    }
                    None => {
                        visits.insert(node, Visit::OnPath);
                        stack.push(Frame::new(&graph, node));
                    }
                },
            }
        }
    }

    None
}
