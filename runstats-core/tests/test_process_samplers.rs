use std::alloc::System;
use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::Duration;

use runstats_core::collectors::{
    concurrency_samples, foreign_call_samples, gc_samples, memory_samples,
};
use runstats_core::{record_collection, ProcessSnapshot, Samples};
use stats_alloc::{StatsAlloc, INSTRUMENTED_SYSTEM};

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

fn returns_keys(expected_keys: &[&str], samples: &Samples) {
    for key in expected_keys {
        assert!(samples.contains_key(*key), "should expose metric {key}");
    }
}

#[test]
fn test_memory_samples() {
    let snapshot = ProcessSnapshot::with_allocator(GLOBAL);
    let samples = memory_samples(&snapshot);

    returns_keys(
        &[
            "memory.objects.HeapObjects",
            "memory.summary.Alloc",
            "memory.counters.Mallocs",
            "memory.counters.Frees",
        ],
        &samples,
    );

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    returns_keys(
        &[
            "memory.summary.System",
            "memory.heap.Idle",
            "memory.heap.InUse",
        ],
        &samples,
    );
}

#[test]
fn test_memory_counters_do_not_decrease() {
    let snapshot = ProcessSnapshot::with_allocator(GLOBAL);
    let before = memory_samples(&snapshot);

    let garbage: BTreeMap<usize, String> = (0..64).map(|i| (i, i.to_string())).collect();
    black_box(&garbage);
    drop(garbage);

    let after = memory_samples(&snapshot);
    assert!(after["memory.counters.Mallocs"] > before["memory.counters.Mallocs"]);
    assert!(after["memory.counters.Frees"] > before["memory.counters.Frees"]);
}

#[test]
fn test_concurrency_samples() {
    let samples = concurrency_samples(&ProcessSnapshot::new());

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    {
        returns_keys(&["goroutines.total"], &samples);
        assert!(samples["goroutines.total"] >= 1.0);
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    let _ = samples;
}

#[test]
fn test_foreign_call_samples() {
    returns_keys(&["cgo.calls"], &foreign_call_samples(&ProcessSnapshot::new()));
}

#[test]
fn test_gc_samples() {
    record_collection(Duration::from_nanos(1_234_567));

    let gcs = gc_samples(&ProcessSnapshot::new());
    returns_keys(&["gc.perSecond", "gc.pauseTimeNs", "gc.pauseTimeMs"], &gcs);

    assert!(gcs["gc.pauseTimeNs"] >= 1_234_567.0);
    assert_eq!(
        gcs["gc.pauseTimeNs"] / 1_000_000.0,
        gcs["gc.pauseTimeMs"],
        "pause time in ns should convert to ms"
    );
}
