// src/dag/graph.rs

use std::collections::HashMap;

use crate::task::Task;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must resolve before this one can run.
    deps: Vec<String>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<String>,
}

/// Simple in-memory DAG representation keyed by task name.
///
/// Acyclicity and reference validity are checked by
/// [`crate::dag::validate`]; here we only keep adjacency information for
/// scheduling. The dependents list is the reverse-dependency index used to
/// re-examine only the tasks affected by a completion.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: HashMap<String, DagNode>,
    /// Task names in declaration order.
    order: Vec<String>,
}

impl DagGraph {
    /// Build a DAG from a task list.
    ///
    /// Dependents are recorded in declaration order of the dependent task.
    /// References to undeclared tasks are ignored.
    pub fn from_tasks<C>(tasks: &[Task<C>]) -> Self {
        let mut nodes: HashMap<String, DagNode> = HashMap::with_capacity(tasks.len());
        let mut order = Vec::with_capacity(tasks.len());

        // First pass: create nodes with their dependency lists.
        for task in tasks {
            if nodes.contains_key(&task.name) {
                continue;
            }
            order.push(task.name.clone());
            nodes.insert(
                task.name.clone(),
                DagNode {
                    deps: task.dependencies.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        // Second pass: populate dependents based on deps.
        for name in &order {
            let deps = nodes
                .get(name)
                .map(|n| n.deps.clone())
                .unwrap_or_default();

            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    if !dep_node.dependents.contains(name) {
                        dep_node.dependents.push(name.clone());
                    }
                }
            }
        }

        Self { nodes, order }
    }

    /// Return all task names in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list this one as a dependency).
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks with no dependencies, in declaration order.
    pub fn roots(&self) -> Vec<&str> {
        self.tasks()
            .filter(|name| self.dependencies_of(name).is_empty())
            .collect()
    }
}
