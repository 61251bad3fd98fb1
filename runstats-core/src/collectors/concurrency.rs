//! Concurrency sampler.

use crate::{RuntimeSnapshot, Sampler, Samples};

/// Samples the number of live threads as `goroutines.total`.
///
/// The live process reports threads on Linux, macOS and Windows; on other
/// platforms the key is omitted.
#[derive(Debug, Default)]
pub struct ConcurrencySampler {
    _private: (),
}

impl ConcurrencySampler {
    /// Creates a new concurrency sampler.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Sampler for ConcurrencySampler {
    fn sample(&self, snapshot: &dyn RuntimeSnapshot) -> Samples {
        concurrency_samples(snapshot)
    }

    fn name(&self) -> &'static str {
        "concurrency"
    }
}

/// Samples the number of live threads from `snapshot`.
pub fn concurrency_samples(snapshot: &dyn RuntimeSnapshot) -> Samples {
    let mut samples = Samples::new();
    super::insert(&mut samples, "goroutines.total", snapshot.threads());
    samples
}
