//! Memory sampler.

use crate::{RuntimeSnapshot, Sampler, Samples};

/// Samples allocator and memory statistics.
///
/// Metrics collected:
/// - `memory.objects.HeapObjects` - Live heap allocations
/// - `memory.summary.Alloc` - Bytes held by live allocations
/// - `memory.summary.System` - Bytes obtained from the operating system
/// - `memory.counters.Mallocs` - Cumulative allocations
/// - `memory.counters.Frees` - Cumulative deallocations
/// - `memory.heap.Idle` - Bytes held but not in use
/// - `memory.heap.InUse` - Bytes in use
#[derive(Debug, Default)]
pub struct MemorySampler {
    _private: (),
}

impl MemorySampler {
    /// Creates a new memory sampler.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Sampler for MemorySampler {
    fn sample(&self, snapshot: &dyn RuntimeSnapshot) -> Samples {
        memory_samples(snapshot)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Samples allocator and memory statistics from `snapshot`.
pub fn memory_samples(snapshot: &dyn RuntimeSnapshot) -> Samples {
    let memory = snapshot.memory();
    let mut samples = Samples::new();

    super::insert(&mut samples, "memory.objects.HeapObjects", memory.heap_objects);
    super::insert(&mut samples, "memory.summary.Alloc", memory.alloc);
    super::insert(&mut samples, "memory.summary.System", memory.system);
    super::insert(&mut samples, "memory.counters.Mallocs", memory.mallocs);
    super::insert(&mut samples, "memory.counters.Frees", memory.frees);
    super::insert(&mut samples, "memory.heap.Idle", memory.heap_idle);
    super::insert(&mut samples, "memory.heap.InUse", memory.heap_in_use);

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStats, StaticSnapshot};

    #[test]
    fn test_memory_sampler() {
        let snapshot = StaticSnapshot {
            memory: MemoryStats {
                heap_objects: Some(12),
                alloc: Some(4096),
                mallocs: Some(40),
                frees: Some(28),
                system: Some(1 << 20),
                heap_idle: Some((1 << 20) - 4096),
                heap_in_use: Some(4096),
            },
            ..Default::default()
        };

        let samples = MemorySampler::new().sample(&snapshot);

        assert_eq!(samples.len(), 7);
        assert_eq!(samples["memory.objects.HeapObjects"], 12.0);
        assert_eq!(samples["memory.summary.Alloc"], 4096.0);
        assert_eq!(samples["memory.counters.Mallocs"], 40.0);
        assert_eq!(samples["memory.counters.Frees"], 28.0);
        assert_eq!(samples["memory.summary.System"], 1048576.0);
        assert_eq!(samples["memory.heap.Idle"], 1044480.0);
        assert_eq!(samples["memory.heap.InUse"], 4096.0);
    }

    #[test]
    fn test_memory_sampler_omits_unavailable() {
        let snapshot = StaticSnapshot {
            memory: MemoryStats {
                system: Some(8192),
                ..Default::default()
            },
            ..Default::default()
        };

        let samples = memory_samples(&snapshot);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples["memory.summary.System"], 8192.0);
    }
}
