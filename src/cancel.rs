// src/cancel.rs

//! Cooperative cancellation.
//!
//! [`CancellationToken`] wraps `tokio_util`'s token and additionally records
//! *why* it fired. Child tokens observe their parent's cancellation and fall
//! back to the parent's reason, which lets the standard strategy tell a
//! workflow timeout apart from an external abort.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::WaitForCancellationFuture;

/// Why a token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit call to [`CancellationToken::cancel`].
    Requested,
    /// A timer derived from a configured timeout fired.
    Timeout(Duration),
}

/// A readable, awaitable, irreversible "stop" signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: tokio_util::sync::CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
    parent: Option<Box<CancellationToken>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a token that is cancelled whenever `self` is, but can also be
    /// cancelled on its own without affecting `self`.
    pub fn child_token(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
            reason: Arc::new(OnceLock::new()),
            parent: Some(Box::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.cancel_with(CancelReason::Requested);
    }

    /// Cancel with an explicit reason. The first cause wins; later calls are
    /// no-ops.
    pub fn cancel_with(&self, reason: CancelReason) {
        if self.inner.is_cancelled() {
            return;
        }
        let _ = self.reason.set(reason);
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// The reason this token (or the ancestor that cancelled it) fired.
    ///
    /// `None` while the token is still live.
    pub fn reason(&self) -> Option<CancelReason> {
        if !self.inner.is_cancelled() {
            return None;
        }
        self.reason
            .get()
            .copied()
            .or_else(|| self.parent.as_ref().and_then(|p| p.reason()))
            .or(Some(CancelReason::Requested))
    }

    /// Resolves once the token is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancelled()
    }
}
