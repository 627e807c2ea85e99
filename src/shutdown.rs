//! Process-wide cancellation flag.
//! Set by the ctrlc handler installed in the binary; the mover polls it
//! between children and between files of a copy.
//!
//! Relaxed atomics are enough for a one-way "stop" flag, and `request()` is
//! safe to call from a signal handler.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Request a cooperative shutdown (idempotent).
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Check whether a shutdown has been requested.
#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Clear the flag. Tests use this to isolate runs from each other.
#[inline]
pub fn reset() {
    SHUTDOWN.store(false, Ordering::Relaxed);
}
