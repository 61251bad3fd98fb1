//! Runtime samplers for the runstats exporter.
//!
//! This crate contains everything needed to turn the state of the running
//! process into a flat set of named numeric samples, without any network
//! code:
//!
//! - [`sanitize_metric_name`] turns arbitrary labels into wire-safe metric
//!   name fragments.
//! - [`RuntimeSnapshot`] abstracts runtime introspection.  The
//!   [`ProcessSnapshot`] reads from the current process while
//!   [`StaticSnapshot`] returns fixed values for tests.
//! - The [`collectors`] module holds the built-in [`Sampler`]s for memory,
//!   concurrency, foreign calls and collection activity.
//!
//! # Usage
//!
//! ```rust
//! use runstats_core::collectors::gc_samples;
//! use runstats_core::{record_collection, ProcessSnapshot};
//! use std::time::Duration;
//!
//! record_collection(Duration::from_micros(250));
//!
//! let samples = gc_samples(&ProcessSnapshot::new());
//! assert!(samples.contains_key("gc.pauseTimeNs"));
//! ```

#![warn(missing_docs)]

mod counters;
mod process;
mod sample;
mod sampler;
mod sanitize;
mod snapshot;

pub mod collectors;

pub use counters::{foreign_calls, record_collection, record_foreign_call, track_foreign_call};
pub use sample::{Sample, Samples};
pub use sampler::Sampler;
pub use sanitize::sanitize_metric_name;
pub use snapshot::{GcStats, MemoryStats, ProcessSnapshot, RuntimeSnapshot, StaticSnapshot};
