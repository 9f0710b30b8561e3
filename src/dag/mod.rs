// src/dag/mod.rs

//! DAG representation, validation and per-run state.
//!
//! - [`graph`] holds the dependency and reverse-dependency adjacency of a
//!   task list.
//! - [`validator`] checks a task list for duplicates, missing dependencies
//!   and cycles before anything runs.
//! - [`state_manager`] owns the mutable state of one run: which tasks are
//!   pending, running or resolved, and which became ready.
//! - [`task_info`] provides the read-only task snapshot used in events.

pub mod graph;
pub mod state_manager;
pub mod task_info;
pub mod validator;

pub use graph::DagGraph;
pub use state_manager::StateManager;
pub use task_info::TaskInfo;
pub use validator::{validate, ValidationDetails, ValidationError, ValidationErrorKind, ValidationResult};
