use std::sync::Arc;

use crate::{Error, StatsOptions};

/// The trait for transports.
///
/// A transport delivers gauge samples to a metrics collector.  Delivery is
/// best effort: errors are logged by the exporter and otherwise ignored.
pub trait Transport: Send + Sync + 'static {
    /// Sends a single gauge sample.
    fn gauge(&self, name: &str, value: f64) -> Result<(), Error>;

    /// Pushes out anything the transport buffered.
    ///
    /// Called once at the end of every push interval.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Releases the transport.  Called once when the exporter stops.
    fn close(&self) {}
}

/// A factory creating transport instances.
///
/// Creating the transport is the connect step of starting the exporter, so
/// a factory error makes [`Stats::start`](crate::Stats::start) fail.
///
/// This is automatically implemented for all closures taking options and
/// returning a transport, and for `Arc<T>` of any transport.
pub trait TransportFactory: Send + Sync {
    /// Given some options creates a transport.
    fn create_transport(&self, options: &StatsOptions) -> Result<Arc<dyn Transport>, Error>;
}

impl<F> TransportFactory for F
where
    F: Fn(&StatsOptions) -> Result<Arc<dyn Transport>, Error> + Send + Sync,
{
    fn create_transport(&self, options: &StatsOptions) -> Result<Arc<dyn Transport>, Error> {
        (*self)(options)
    }
}

impl<T: Transport> TransportFactory for Arc<T> {
    fn create_transport(&self, _options: &StatsOptions) -> Result<Arc<dyn Transport>, Error> {
        Ok(self.clone())
    }
}
