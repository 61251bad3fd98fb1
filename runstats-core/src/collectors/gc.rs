//! Collection activity sampler.

use crate::{RuntimeSnapshot, Sampler, Samples};

/// Samples collection activity.
///
/// Metrics collected:
/// - `gc.perSecond` - Average collections per second since process start
/// - `gc.pauseTimeNs` - Total pause time in nanoseconds
/// - `gc.pauseTimeMs` - Total pause time in milliseconds
///
/// Collections are counted with
/// [`record_collection`](crate::record_collection).
#[derive(Debug, Default)]
pub struct GcSampler {
    _private: (),
}

impl GcSampler {
    /// Creates a new collection sampler.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Sampler for GcSampler {
    fn sample(&self, snapshot: &dyn RuntimeSnapshot) -> Samples {
        gc_samples(snapshot)
    }

    fn name(&self) -> &'static str {
        "gc"
    }
}

/// Samples collection activity from `snapshot`.
pub fn gc_samples(snapshot: &dyn RuntimeSnapshot) -> Samples {
    let mut samples = Samples::new();
    let Some(gc) = snapshot.gc() else {
        return samples;
    };

    let uptime = gc.uptime.as_secs_f64();
    let per_second = if uptime > 0.0 {
        gc.collections as f64 / uptime
    } else {
        0.0
    };
    // the millisecond figure is derived from the nanosecond one, never sampled
    let pause_ns = gc.pause_total_ns as f64;

    samples.insert("gc.perSecond".into(), per_second);
    samples.insert("gc.pauseTimeNs".into(), pause_ns);
    samples.insert("gc.pauseTimeMs".into(), pause_ns / 1_000_000.0);
    samples
}
