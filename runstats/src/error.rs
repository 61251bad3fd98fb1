use std::io;

use thiserror::Error;

/// Errors raised while starting the exporter or talking to statsd.
#[derive(Debug, Error)]
pub enum Error {
    /// The statsd address did not resolve to any socket address.
    #[error("statsd address `{0}` does not resolve to a socket address")]
    InvalidAddress(String),
    /// The push interval is zero.
    #[error("push interval must be greater than zero")]
    InvalidInterval,
    /// Resolving the address or setting up the socket failed.
    #[error("failed to set up the statsd socket")]
    Io(#[from] io::Error),
    /// The metric sink rejected a metric or could not be created.
    #[error("failed to emit metric")]
    Metric(#[from] cadence::MetricError),
    /// The background worker thread could not be spawned.
    #[error("failed to spawn the worker thread")]
    Spawn(#[source] io::Error),
    /// The exporter was already stopped and cannot be started again.
    #[error("the exporter has been stopped")]
    Stopped,
}
