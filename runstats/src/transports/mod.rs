//! The provided transports.
//!
//! The default transport sends plain statsd gauges over UDP through
//! [`cadence`].

mod statsd;

pub use statsd::{StatsdTransport, StatsdTransportFactory};
