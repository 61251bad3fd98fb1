//! Built-in samplers.
//!
//! This module contains samplers for the common runtime metrics:
//! - Memory and allocator state
//! - Live thread count
//! - Foreign call count
//! - Collection activity
//!
//! Every sampler is also available as a plain function taking a
//! [`RuntimeSnapshot`](crate::RuntimeSnapshot).

mod concurrency;
mod foreign;
mod gc;
mod memory;

pub use concurrency::{concurrency_samples, ConcurrencySampler};
pub use foreign::{foreign_call_samples, ForeignCallSampler};
pub use gc::{gc_samples, GcSampler};
pub use memory::{memory_samples, MemorySampler};

fn insert(samples: &mut crate::Samples, key: &str, value: Option<u64>) {
    if let Some(value) = value {
        samples.insert(key.to_owned(), value as f64);
    }
}

