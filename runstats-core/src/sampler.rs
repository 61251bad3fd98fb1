//! Sampler trait.

use crate::{RuntimeSnapshot, Samples};

/// Trait for metric samplers.
///
/// Implement this trait to push application-specific metrics alongside the
/// built-in runtime metrics.
///
/// # Example
///
/// ```rust
/// use runstats_core::{RuntimeSnapshot, Sampler, Samples};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct ConnectionPoolSampler {
///     active: AtomicUsize,
/// }
///
/// impl Sampler for ConnectionPoolSampler {
///     fn sample(&self, _snapshot: &dyn RuntimeSnapshot) -> Samples {
///         let mut samples = Samples::new();
///         samples.insert(
///             "db.pool.active".into(),
///             self.active.load(Ordering::Relaxed) as f64,
///         );
///         samples
///     }
///
///     fn name(&self) -> &'static str {
///         "connection-pool"
///     }
/// }
/// ```
pub trait Sampler: Send + Sync + 'static {
    /// Takes a sample.
    ///
    /// This is called once per push interval from the background worker.
    /// It must be fast and must not panic.  Values that cannot be obtained
    /// are left out of the result.
    fn sample(&self, snapshot: &dyn RuntimeSnapshot) -> Samples;

    /// Name of this sampler for debugging and logging.
    fn name(&self) -> &'static str;
}
