//! Foreign call sampler.

use crate::{RuntimeSnapshot, Sampler, Samples};

/// Samples the cumulative number of foreign calls as `cgo.calls`.
///
/// Calls are counted with [`record_foreign_call`](crate::record_foreign_call)
/// or [`track_foreign_call`](crate::track_foreign_call).
#[derive(Debug, Default)]
pub struct ForeignCallSampler {
    _private: (),
}

impl ForeignCallSampler {
    /// Creates a new foreign call sampler.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Sampler for ForeignCallSampler {
    fn sample(&self, snapshot: &dyn RuntimeSnapshot) -> Samples {
        foreign_call_samples(snapshot)
    }

    fn name(&self) -> &'static str {
        "foreign-calls"
    }
}

/// Samples the cumulative number of foreign calls from `snapshot`.
pub fn foreign_call_samples(snapshot: &dyn RuntimeSnapshot) -> Samples {
    let mut samples = Samples::new();
    super::insert(&mut samples, "cgo.calls", snapshot.foreign_calls());
    samples
}
