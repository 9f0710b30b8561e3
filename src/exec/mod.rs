// src/exec/mod.rs

//! Task execution layer.
//!
//! This module is responsible for actually invoking task bodies and turning
//! every possible outcome into a `TaskResult`.
//!
//! - [`strategy`] provides the `ExecutionStrategy` trait.
//! - [`standard`] runs a task once: condition, cancellation check, body,
//!   per-task timeout.
//! - [`retry`] wraps another strategy with retry/backoff.
//! - [`dry_run`] reports success without invoking anything.

pub mod dry_run;
pub mod retry;
pub mod standard;
pub mod strategy;

pub use dry_run::DryRunStrategy;
pub use retry::RetryStrategy;
pub use standard::StandardStrategy;
pub use strategy::ExecutionStrategy;
