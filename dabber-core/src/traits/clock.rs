//! Time source trait

use core::future::Future;

/// Monotonic time source with async delay
///
/// Supplied by the host (embassy-time, tokio, a test clock, ...).
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Suspend for the given number of milliseconds
    fn delay_ms(&self, ms: u64) -> impl Future<Output = ()>;
}
