//! Pushes runtime metrics to a local statsd for a few intervals.
//!
//! Listen with `nc -ul 8125` to see the gauges arrive.

use std::alloc::System;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use runstats::{
    record_collection, track_foreign_call, RuntimeSnapshot, Sampler, Samples, Stats, StatsOptions,
};
use stats_alloc::{StatsAlloc, INSTRUMENTED_SYSTEM};

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

/// Custom sampler example - monitors a hypothetical connection pool
struct ConnectionPoolSampler {
    active: AtomicUsize,
}

impl Sampler for ConnectionPoolSampler {
    fn sample(&self, _snapshot: &dyn RuntimeSnapshot) -> Samples {
        let mut samples = Samples::new();
        samples.insert(
            "db.pool.active".into(),
            self.active.fetch_add(1, Ordering::Relaxed) as f64,
        );
        samples
    }

    fn name(&self) -> &'static str {
        "connection-pool"
    }
}

fn main() -> Result<(), runstats::Error> {
    pretty_env_logger::init();

    let stats = Stats::with_options(
        StatsOptions::from_env()
            .with_interval(Duration::from_secs(1))
            .with_allocator(GLOBAL)
            .add_sampler(ConnectionPoolSampler {
                active: AtomicUsize::new(0),
            }),
    );

    println!("Pushing to {} as {}", stats.statsd_host(), stats.metric_base());
    for sample in stats.collect() {
        println!("  {:<60} {}", sample.name, sample.value);
    }

    stats.start()?;
    for round in 0..5 {
        let pid = track_foreign_call(std::process::id);
        record_collection(Duration::from_micros(100 * (round + 1)));
        println!("round {round} in process {pid}");
        thread::sleep(Duration::from_secs(1));
    }
    stats.stop();

    Ok(())
}
