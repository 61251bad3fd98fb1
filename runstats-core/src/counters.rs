//! Process-wide counters fed by the application.
//!
//! Rust has neither a runtime-managed foreign call boundary nor a tracing
//! garbage collector, so these counters are maintained by the code that
//! crosses into C or that runs its own reclamation (arenas, epoch based
//! reclamation, cycle collectors, caches).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static FOREIGN_CALLS: AtomicU64 = AtomicU64::new(0);
static COLLECTIONS: AtomicU64 = AtomicU64::new(0);
static PAUSE_TOTAL_NS: AtomicU64 = AtomicU64::new(0);

/// Records one call into foreign code.
pub fn record_foreign_call() {
    FOREIGN_CALLS.fetch_add(1, Ordering::Relaxed);
}

/// Runs `f`, counting it as one call into foreign code.
///
/// # Examples
///
/// ```
/// let pid = runstats_core::track_foreign_call(std::process::id);
/// assert!(runstats_core::foreign_calls() >= 1);
/// # let _ = pid;
/// ```
pub fn track_foreign_call<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    record_foreign_call();
    f()
}

/// Returns the cumulative number of recorded foreign calls.
pub fn foreign_calls() -> u64 {
    FOREIGN_CALLS.load(Ordering::Relaxed)
}

/// Records one completed collection cycle and the time it paused the
/// application.
pub fn record_collection(pause: Duration) {
    let pause_ns = u64::try_from(pause.as_nanos()).unwrap_or(u64::MAX);
    COLLECTIONS.fetch_add(1, Ordering::Relaxed);
    PAUSE_TOTAL_NS.fetch_add(pause_ns, Ordering::Relaxed);
}

/// Returns the number of recorded collections and their total pause in
/// nanoseconds.
pub(crate) fn collections() -> (u64, u64) {
    (
        COLLECTIONS.load(Ordering::Relaxed),
        PAUSE_TOTAL_NS.load(Ordering::Relaxed),
    )
}
