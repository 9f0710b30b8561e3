// src/engine/plugin.rs

use crate::engine::notifier::EventNotifier;

/// Extension hook installed once, before the first workflow run of an
/// executor. A plugin only sees the notifier: it may subscribe to lifecycle
/// events but has no other access to engine internals.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn install(&self, notifier: &EventNotifier) -> anyhow::Result<()>;
}
