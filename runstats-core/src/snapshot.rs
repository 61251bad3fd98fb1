//! Runtime introspection.

use std::alloc::System;
use std::fmt;
use std::time::Duration;

use stats_alloc::StatsAlloc;

use crate::{counters, process};

/// Allocator and memory statistics.
///
/// Every field is optional; samplers leave out the metrics whose source is
/// unavailable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Number of live heap allocations.
    pub heap_objects: Option<u64>,
    /// Bytes held by live heap allocations.
    pub alloc: Option<u64>,
    /// Cumulative number of allocations.
    pub mallocs: Option<u64>,
    /// Cumulative number of deallocations.
    pub frees: Option<u64>,
    /// Bytes the process holds from the operating system.
    pub system: Option<u64>,
    /// Bytes held from the operating system but not backing live allocations.
    pub heap_idle: Option<u64>,
    /// Bytes backing live allocations.
    pub heap_in_use: Option<u64>,
}

/// Cumulative collection statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Number of completed collections.
    pub collections: u64,
    /// Total pause time of all collections, in nanoseconds.
    pub pause_total_ns: u64,
    /// Time since the process started.
    pub uptime: Duration,
}

/// A source of runtime statistics.
///
/// The built-in samplers read exclusively through this trait, so they can
/// be pointed at a [`StaticSnapshot`] in tests instead of at the live
/// process.
pub trait RuntimeSnapshot: Send + Sync + 'static {
    /// Current allocator and memory statistics.
    fn memory(&self) -> MemoryStats;

    /// Current number of live threads.
    fn threads(&self) -> Option<u64>;

    /// Cumulative number of calls into foreign code.
    fn foreign_calls(&self) -> Option<u64>;

    /// Cumulative collection statistics.
    fn gc(&self) -> Option<GcStats>;
}

/// Reads runtime statistics from the current process.
///
/// Heap figures (`Alloc`, `heap.InUse`, `heap.Idle`) come from glibc's
/// `mallinfo2` on Linux, or from jemalloc with the `jemalloc` feature.  The
/// allocation counters (`HeapObjects`, `Mallocs`, `Frees`) are only
/// available when the instrumented allocator that the application installed
/// as its global allocator is attached with
/// [`ProcessSnapshot::with_allocator`].
///
/// # Examples
///
/// ```rust,ignore
/// use runstats_core::ProcessSnapshot;
/// use stats_alloc::{StatsAlloc, INSTRUMENTED_SYSTEM};
/// use std::alloc::System;
///
/// #[global_allocator]
/// static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;
///
/// let snapshot = ProcessSnapshot::with_allocator(GLOBAL);
/// ```
#[derive(Clone, Copy)]
pub struct ProcessSnapshot {
    allocator: Option<&'static StatsAlloc<System>>,
}

impl ProcessSnapshot {
    /// Creates a snapshot source without allocation counters.
    pub fn new() -> Self {
        process::start_clock();
        Self { allocator: None }
    }

    /// Creates a snapshot source that reads allocation counters from the
    /// given instrumented allocator.
    pub fn with_allocator(allocator: &'static StatsAlloc<System>) -> Self {
        process::start_clock();
        Self {
            allocator: Some(allocator),
        }
    }
}

impl Default for ProcessSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProcessSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSnapshot")
            .field("allocator", &self.allocator.is_some())
            .finish()
    }
}

impl RuntimeSnapshot for ProcessSnapshot {
    fn memory(&self) -> MemoryStats {
        let mut stats = MemoryStats {
            system: process::resident_bytes(),
            ..Default::default()
        };

        if let Some(malloc) = process::malloc_info() {
            stats.alloc = Some(malloc.in_use);
            stats.heap_in_use = Some(malloc.in_use);
            stats.heap_idle = Some(malloc.free);
        }

        if let Some(allocator) = self.allocator {
            let counts = allocator.stats();
            let live = counts.bytes_allocated as i128 - counts.bytes_deallocated as i128
                + counts.bytes_reallocated as i128;
            let live = u64::try_from(live.max(0)).unwrap_or(u64::MAX);

            stats.heap_objects =
                Some(counts.allocations.saturating_sub(counts.deallocations) as u64);
            stats.alloc = Some(live);
            stats.mallocs = Some(counts.allocations as u64);
            stats.frees = Some(counts.deallocations as u64);
            stats.heap_in_use = Some(live);
        }

        #[cfg(all(unix, feature = "jemalloc"))]
        {
            if let Some((mapped, allocated)) = process::jemalloc_stats() {
                stats.system = Some(mapped);
                stats.alloc = Some(allocated);
                stats.heap_in_use = Some(allocated);
                stats.heap_idle = Some(mapped.saturating_sub(allocated));
            }
        }

        if stats.heap_idle.is_none() {
            stats.heap_idle = stats
                .system
                .zip(stats.heap_in_use)
                .map(|(system, in_use)| system.saturating_sub(in_use));
        }

        stats
    }

    fn threads(&self) -> Option<u64> {
        process::thread_count()
    }

    fn foreign_calls(&self) -> Option<u64> {
        Some(counters::foreign_calls())
    }

    fn gc(&self) -> Option<GcStats> {
        let (collections, pause_total_ns) = counters::collections();
        Some(GcStats {
            collections,
            pause_total_ns,
            uptime: process::uptime(),
        })
    }
}

/// A snapshot source returning fixed values.
///
/// # Examples
///
/// ```
/// use runstats_core::collectors::concurrency_samples;
/// use runstats_core::StaticSnapshot;
///
/// let snapshot = StaticSnapshot {
///     threads: Some(4),
///     ..Default::default()
/// };
/// assert_eq!(concurrency_samples(&snapshot)["goroutines.total"], 4.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticSnapshot {
    /// Returned from [`RuntimeSnapshot::memory`].
    pub memory: MemoryStats,
    /// Returned from [`RuntimeSnapshot::threads`].
    pub threads: Option<u64>,
    /// Returned from [`RuntimeSnapshot::foreign_calls`].
    pub foreign_calls: Option<u64>,
    /// Returned from [`RuntimeSnapshot::gc`].
    pub gc: Option<GcStats>,
}

impl RuntimeSnapshot for StaticSnapshot {
    fn memory(&self) -> MemoryStats {
        self.memory
    }

    fn threads(&self) -> Option<u64> {
        self.threads
    }

    fn foreign_calls(&self) -> Option<u64> {
        self.foreign_calls
    }

    fn gc(&self) -> Option<GcStats> {
        self.gc
    }
}
