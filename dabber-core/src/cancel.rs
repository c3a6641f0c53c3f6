//! Cooperative cancellation

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag
///
/// Clones share the same flag. Runs poll it only between steps, so a
/// cancelled run always finishes the command batch in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clear a previous request so the token can be reused
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}
