// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the ready queue ([`queue`]), ordered by priority then arrival
//! - lifecycle event publish/subscribe ([`notifier`])
//! - plugins that hook into the notifier ([`plugin`])
//! - the workflow executor that drives a run end to end ([`executor`])

pub mod executor;
pub mod notifier;
pub mod plugin;
pub mod queue;

pub use executor::WorkflowExecutor;
pub use notifier::{EventKind, EventNotifier, Listener, WorkflowEvent};
pub use plugin::Plugin;
pub use queue::PriorityQueue;
