//! Cancellation tokens for superseded and disposed fetches.
//!
//! Every logical fetch attempt carries a [`CancelToken`]. The
//! [`CancellationManager`] keeps exactly one token current: renewing cancels
//! the previous token with [`CancelReason::Superseded`], and dropping the
//! manager cancels the current one with [`CancelReason::Disposed`].
//!
//! Cancellation is cooperative. Sources race their request against
//! [`CancelToken::cancelled`], and consumers compare token identity before
//! applying a result so that a transport which ignores cancellation still
//! cannot overwrite newer state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::RickdashError;

/// Why a token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// A newer fetch attempt replaced this one.
    Superseded,
    /// The owning coordinator was torn down.
    Disposed,
    /// The caller asked for cancellation explicitly.
    Requested,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Superseded => write!(f, "superseded"),
            CancelReason::Disposed => write!(f, "disposed"),
            CancelReason::Requested => write!(f, "cancelled"),
        }
    }
}

/// Handle representing one fetch attempt.
#[derive(Debug, Clone)]
pub struct CancelToken {
    id: u64,
    inner: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelToken {
    fn new(id: u64) -> Self {
        Self {
            id,
            inner: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Identity of the attempt; unique per manager.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// The first reason this token was cancelled with.
    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }

    /// The error a source should return when it stops because of this token.
    pub fn to_error(&self) -> RickdashError {
        RickdashError::Cancelled(self.reason().unwrap_or(CancelReason::Requested))
    }

    fn cancel(&self, reason: CancelReason) {
        // Reason is recorded before the signal so observers always see one.
        let _ = self.reason.set(reason);
        self.inner.cancel();
    }
}

/// Owns the single current [`CancelToken`] of a coordinator.
#[derive(Debug, Default)]
pub struct CancellationManager {
    current: Mutex<Option<CancelToken>>,
    next_id: AtomicU64,
}

impl CancellationManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&self) -> CancelToken {
        CancelToken::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Returns the active token, minting one if none exists or the existing
    /// one was already cancelled.
    pub fn current(&self) -> CancelToken {
        let mut current = self.current.lock();
        match current.as_ref() {
            Some(token) if !token.is_cancelled() => token.clone(),
            _ => {
                let token = self.mint();
                *current = Some(token.clone());
                token
            }
        }
    }

    /// Cancels the current token as superseded and installs a fresh one.
    pub fn renew(&self) -> CancelToken {
        let token = self.mint();
        let previous = self.current.lock().replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel(CancelReason::Superseded);
        }
        token
    }

    /// Cancels the current token in place without creating a replacement.
    pub fn cancel(&self, reason: CancelReason) {
        if let Some(token) = self.current.lock().as_ref() {
            token.cancel(reason);
        }
    }

    /// Whether `token` is still the live, current attempt.
    pub fn is_current(&self, token: &CancelToken) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|current| current.id == token.id && !current.is_cancelled())
    }

    /// Final cancellation for the owning scope.
    pub fn dispose(&self) {
        self.cancel(CancelReason::Disposed);
    }
}

impl Drop for CancellationManager {
    fn drop(&mut self) {
        self.dispose();
    }
}
