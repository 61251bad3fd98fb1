//! A background runtime metrics exporter for statsd.
//!
//! `runstats` periodically samples the running process (allocator state,
//! live threads, foreign calls, collection activity) and pushes every value
//! as a gauge to a statsd compatible collector over UDP.  Delivery is fire
//! and forget: nothing is retried and lost packets are not reported.
//!
//! Every metric is named `<client_name>.<hostname>.<metric>`, where the
//! hostname is [sanitized](sanitize_metric_name) so it always forms a single
//! path segment.
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let stats = runstats::start("127.0.0.1:8125", Duration::from_secs(10), "api")?;
//! // metrics such as `api.<host>.memory.summary.System` are now pushed
//! // every ten seconds until the exporter is stopped or dropped.
//! stats.stop();
//! # Ok::<(), runstats::Error>(())
//! ```
//!
//! Heap figures are read from the C allocator where it reports them (glibc)
//! or from jemalloc.  Allocation counters require the instrumented allocator
//! from [`stats_alloc`](https://docs.rs/stats_alloc) to be installed as
//! global allocator and handed to the exporter:
//!
//! ```rust,ignore
//! use runstats::{Stats, StatsOptions};
//! use stats_alloc::{StatsAlloc, INSTRUMENTED_SYSTEM};
//! use std::alloc::System;
//!
//! #[global_allocator]
//! static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;
//!
//! let stats = Stats::with_options(
//!     StatsOptions::from_env().with_allocator(GLOBAL),
//! );
//! stats.start()?;
//! ```
//!
//! # Features
//!
//! - `feature = "test"`: Activates the [`test`] module, which provides a
//!   transport that records samples for inspection.
//! - `feature = "jemalloc"`: Reads memory figures from jemalloc's statistics.
//!
//! [`test`]: test/index.html

#![warn(missing_docs)]

// macros; these need to be first to be used by other modules
#[macro_use]
mod macros;

mod error;
mod options;
mod stats;
mod transport;
mod utils;
mod worker;

pub mod transports;

pub use crate::error::Error;
pub use crate::options::{
    apply_defaults, StatsOptions, DEFAULT_CLIENT_NAME, DEFAULT_PUSH_INTERVAL, DEFAULT_STATSD_HOST,
};
pub use crate::stats::{metric_base, start, State, Stats};
pub use crate::transport::{Transport, TransportFactory};

pub use runstats_core::{
    collectors, foreign_calls, record_collection, record_foreign_call, sanitize_metric_name,
    track_foreign_call, GcStats, MemoryStats, ProcessSnapshot, RuntimeSnapshot, Sample, Sampler,
    Samples, StaticSnapshot,
};
