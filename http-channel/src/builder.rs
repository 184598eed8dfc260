//! Connection builder.
//!
//! Fluent configuration for a [`Connection`] backed by the default
//! [`HyperTransport`]. Address options follow the resolution rules in
//! [`crate::config`]; the transport knobs are forwarded to
//! [`HyperTransportBuilder`](crate::transport::HyperTransportBuilder).

use std::net::IpAddr;
use std::time::Duration;

use crate::config::ConnectOptions;
use crate::connection::Connection;
use crate::error::TransportError;
use crate::transport::HyperTransport;

/// Builder for creating a [`Connection`].
///
/// # Example
///
/// ```no_run
/// use http_channel::ConnectionBuilder;
///
/// # fn run() -> Result<(), http_channel::TransportError> {
/// let conn = ConnectionBuilder::new()
///     .host("173.240.5.253")
///     .port(443)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConnectionBuilder {
    options: ConnectOptions,
    pool_idle_timeout: Option<Duration>,
    pool_max_idle_per_host: Option<usize>,
    tcp_keepalive: Option<Duration>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the address options wholesale.
    pub fn options(mut self, options: ConnectOptions) -> Self {
        self.options = options;
        self
    }

    /// Target host.
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.options.host = Some(host.into());
        self
    }

    /// Target port.
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = Some(port);
        self
    }

    /// Proxy host; takes precedence over [`host`](Self::host).
    pub fn proxy_host<S: Into<String>>(mut self, host: S) -> Self {
        self.options.proxy_host = Some(host.into());
        self
    }

    /// Proxy port; takes precedence over [`port`](Self::port).
    pub fn proxy_port(mut self, port: u16) -> Self {
        self.options.proxy_port = Some(port);
        self
    }

    /// Local address to bind outgoing sockets to.
    pub fn local_address(mut self, addr: IpAddr) -> Self {
        self.options.local_address = Some(addr);
        self
    }

    /// Connection pool idle timeout of the underlying transport.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Maximum idle pooled connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    /// TCP keep-alive probe interval.
    pub fn tcp_keepalive(mut self, interval: Duration) -> Self {
        self.tcp_keepalive = Some(interval);
        self
    }

    /// Build the connection.
    ///
    /// # Errors
    ///
    /// [`TransportError::Request`] when the configured host does not form
    /// a valid URI.
    pub fn build(self) -> Result<Connection<HyperTransport>, TransportError> {
        let mut transport = HyperTransport::builder();
        if let Some(addr) = self.options.local_address {
            transport = transport.local_address(addr);
        }
        if let Some(timeout) = self.pool_idle_timeout {
            transport = transport.pool_idle_timeout(timeout);
        }
        if let Some(max) = self.pool_max_idle_per_host {
            transport = transport.pool_max_idle_per_host(max);
        }
        if let Some(interval) = self.tcp_keepalive {
            transport = transport.tcp_keepalive(interval);
        }
        Connection::with_capability(self.options, transport.build())
    }
}
