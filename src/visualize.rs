// src/visualize.rs

//! Mermaid rendering of a task graph.
//!
//! ```text
//! graph TD
//!     fetch["fetch"]
//!     build_app["build app"]
//!     fetch --> build_app
//! ```
//!
//! Node ids are derived from task names: characters outside `[A-Za-z0-9_]`
//! become `_`, ids that would be empty or start with a digit get an `n_`
//! prefix, and ids that collide with an earlier one get `_2`, `_3`, ...
//! appended. Output is deterministic for a given task order.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use anyhow::Context;
use regex::Regex;

use crate::errors::Result;
use crate::task::Task;

/// Render `tasks` as a Mermaid `graph TD` diagram.
///
/// Dependencies that name no task still get a node, so the output is usable
/// for graphs that would fail validation.
pub fn to_mermaid<C>(tasks: &[Task<C>]) -> Result<String> {
    let unsafe_chars = Regex::new(r"[^A-Za-z0-9_]").context("compiling node id pattern")?;
    let mut ids = NodeIds::new(unsafe_chars);

    let mut nodes = String::new();
    let mut edges = String::new();

    for task in tasks {
        ids.declare(&task.name, &mut nodes);
    }

    for task in tasks {
        let Some(to) = ids.get(&task.name) else {
            continue;
        };
        let to = to.to_string();
        for dep in &task.dependencies {
            let from = ids.declare(dep, &mut nodes);
            let _ = writeln!(edges, "    {from} --> {to}");
        }
    }

    let mut out = String::from("graph TD\n");
    out.push_str(&nodes);
    out.push_str(&edges);
    Ok(out)
}

struct NodeIds {
    unsafe_chars: Regex,
    by_name: HashMap<String, String>,
    taken: HashSet<String>,
}

impl NodeIds {
    fn new(unsafe_chars: Regex) -> Self {
        Self {
            unsafe_chars,
            by_name: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Id for `name`, emitting a node line into `nodes` the first time.
    fn declare(&mut self, name: &str, nodes: &mut String) -> String {
        if let Some(id) = self.by_name.get(name) {
            return id.clone();
        }

        let base = self.sanitize(name);
        let mut id = base.clone();
        let mut n = 2;
        while self.taken.contains(&id) {
            id = format!("{base}_{n}");
            n += 1;
        }

        let _ = writeln!(nodes, "    {id}[\"{}\"]", name.replace('"', "#quot;"));
        self.taken.insert(id.clone());
        self.by_name.insert(name.to_string(), id.clone());
        id
    }

    fn sanitize(&self, name: &str) -> String {
        let id = self.unsafe_chars.replace_all(name, "_");
        match id.chars().next() {
            None => "n_".to_string(),
            Some(c) if c.is_ascii_digit() => format!("n_{id}"),
            Some(_) => id.into_owned(),
        }
    }
}
