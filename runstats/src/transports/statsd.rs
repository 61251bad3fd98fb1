use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;

use cadence::{BufferedUdpMetricSink, Gauged, StatsdClient};

use crate::{Error, StatsOptions, Transport, TransportFactory};

/// A transport sending statsd gauges over UDP.
///
/// Gauges are buffered and sent as newline separated packets when the
/// buffer fills up or when the exporter flushes at the end of a push
/// interval.  Nothing is acknowledged or retried.
pub struct StatsdTransport {
    client: StatsdClient,
    target: SocketAddr,
}

impl StatsdTransport {
    /// Resolves `address` and binds an ephemeral UDP socket for sending to it.
    ///
    /// Fails if the address does not resolve or the socket cannot be set up.
    /// Since UDP is connectionless this succeeds even if nothing listens on
    /// the other end.
    pub fn connect(address: &str) -> Result<Self, Error> {
        let target = address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::InvalidAddress(address.to_owned()))?;

        let bind: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind)?;
        socket.set_nonblocking(true)?;

        let sink = BufferedUdpMetricSink::from(target, socket)?;
        runstats_debug!("sending metrics to statsd at {} ({})", address, target);

        Ok(Self {
            client: StatsdClient::from_sink("", sink),
            target,
        })
    }

    /// The resolved address metrics are sent to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transport for StatsdTransport {
    fn gauge(&self, name: &str, value: f64) -> Result<(), Error> {
        self.client.gauge(name, value)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        self.client.flush()?;
        Ok(())
    }

    fn close(&self) {
        if let Err(err) = self.client.flush() {
            runstats_debug!("failed to flush statsd sink on close: {}", err);
        }
    }
}

/// Creates a [`StatsdTransport`] for the configured statsd address.
///
/// This is the transport factory used when none is configured.
#[derive(Clone, Debug, Default)]
pub struct StatsdTransportFactory;

impl TransportFactory for StatsdTransportFactory {
    fn create_transport(&self, options: &StatsOptions) -> Result<Arc<dyn Transport>, Error> {
        Ok(Arc::new(StatsdTransport::connect(options.statsd_host())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_connect_rejects_missing_port() {
        assert!(StatsdTransport::connect("localhost").is_err());
    }

    #[test]
    fn test_gauges_reach_socket() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let address = server.local_addr().unwrap().to_string();

        let transport = StatsdTransport::connect(&address).unwrap();
        assert_eq!(transport.target(), server.local_addr().unwrap());

        transport.gauge("testclient.localhost.cgo.calls", 3.0).unwrap();
        transport.flush().unwrap();

        let mut buf = [0u8; 1024];
        let len = server.recv(&mut buf).unwrap();
        let packet = std::str::from_utf8(&buf[..len]).unwrap();
        assert!(packet.starts_with("testclient.localhost.cgo.calls:3"));
        assert!(packet.trim_end().ends_with("|g"));
    }
}
