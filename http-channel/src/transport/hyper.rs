//! Hyper-based HTTP capability.

use std::net::IpAddr;
use std::time::Duration;

use http_body_util::BodyExt;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use super::body::TransportBody;
use super::{HttpCapability, ResponseBody};
use crate::error::TransportError;

/// Type alias for the hyper client over a plain TCP connector.
type HyperClient = Client<HttpConnector, TransportBody>;

/// HTTP capability backed by hyper_util's legacy client.
///
/// HTTP/1.1 with connection pooling; keep-alive connections are reused
/// across request/response cycles, which is what gives the buffered
/// transport its "persistent channel" feel over stateless HTTP.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a new transport with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpCapability for HyperTransport {
    async fn send(
        &self,
        request: http::Request<TransportBody>,
    ) -> Result<http::Response<ResponseBody>, TransportError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| TransportError::Transport(format!("request failed: {e}")))?;
        Ok(response.map(|body| {
            body.map_err(|e| TransportError::Transport(format!("response body failed: {e}")))
                .boxed()
        }))
    }
}

/// Builder for [`HyperTransport`].
#[derive(Debug)]
pub struct HyperTransportBuilder {
    /// Local address to bind outgoing sockets to.
    local_address: Option<IpAddr>,
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
    /// TCP keep-alive probe interval.
    tcp_keepalive: Option<Duration>,
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransportBuilder {
    /// Create a new transport builder with default settings.
    pub fn new() -> Self {
        Self {
            local_address: None,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            tcp_keepalive: None,
        }
    }

    /// Bind outgoing sockets to the given local address.
    pub fn local_address(mut self, addr: IpAddr) -> Self {
        self.local_address = Some(addr);
        self
    }

    /// Set the connection pool idle timeout.
    ///
    /// Pooled connections idle for longer than this are closed.
    /// Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the maximum number of idle connections per host.
    ///
    /// Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable TCP keep-alive probes at the given interval.
    pub fn tcp_keepalive(mut self, interval: Duration) -> Self {
        self.tcp_keepalive = Some(interval);
        self
    }

    /// Build the transport.
    pub fn build(self) -> HyperTransport {
        let mut connector = HttpConnector::new();
        connector.set_local_address(self.local_address);
        connector.set_keepalive(self.tcp_keepalive);
        connector.set_nodelay(true);

        let mut builder = Client::builder(TokioExecutor::new());

        // Pool timer is required for pool_idle_timeout to take effect.
        builder.pool_timer(TokioTimer::new());
        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        HyperTransport {
            client: builder.build(connector),
        }
    }
}
