//! Cooperative cancellation.
//!
//! A resize checks its [`CancelToken`] between seam removals. A
//! [`ResizeSession`] models the editing loop where only the latest request
//! matters: starting a new job cancels whichever one is still running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared flag that asks a running resize to stop.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Hands out tokens so that each new job supersedes the previous one.
#[derive(Debug, Default)]
pub struct ResizeSession {
    current: Mutex<Option<CancelToken>>,
}

impl ResizeSession {
    /// Create a session with no job in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the in-flight job, if any, and return the token for a new one.
    pub fn begin(&self) -> CancelToken {
        let token = CancelToken::new();
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.replace(token.clone()) {
            log::debug!("superseding in-flight resize");
            previous.cancel();
        }
        token
    }

    /// Cancel the in-flight job without starting another.
    pub fn cancel_current(&self) {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = current.as_ref() {
            token.cancel();
        }
    }
}
