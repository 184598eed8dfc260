//! Connection address configuration and resolution.
//!
//! [`ConnectOptions`] is the caller-facing surface; [`Endpoint`] is the
//! resolved form the connection actually dials. Resolution applies the
//! proxy-over-direct precedence rule and fills in defaults, and the
//! resolved endpoint is retained verbatim (as JSON) for diagnostics.

use std::net::IpAddr;

use http::Uri;
use serde::Serialize;

use crate::error::TransportError;

/// Fixed endpoint path the upper protocol expects on the server side.
///
/// Not caller-configurable: the path is part of the protocol definition,
/// not of the address.
pub const ENDPOINT_PATH: &str = "/apiw1";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 80;

/// Address configuration for a [`Connection`](crate::Connection).
///
/// All fields are optional. When a proxy host/port is given it takes
/// precedence over the direct host/port; when nothing is given the
/// connection dials `localhost:80`.
///
/// # Example
///
/// ```
/// use http_channel::{ConnectOptions, Endpoint};
///
/// let endpoint = Endpoint::resolve(
///     &ConnectOptions::new().host("173.240.5.253").port(443),
/// );
/// assert_eq!(endpoint.host, "173.240.5.253");
/// assert_eq!(endpoint.port, 443);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Target host. Ignored when `proxy_host` is set.
    pub host: Option<String>,
    /// Target port. Ignored when `proxy_port` is set.
    pub port: Option<u16>,
    /// Proxy host, dialed instead of `host` when present.
    pub proxy_host: Option<String>,
    /// Proxy port, dialed instead of `port` when present.
    pub proxy_port: Option<u16>,
    /// Local address to bind outgoing sockets to.
    ///
    /// Passed explicitly rather than read from ambient process state, so
    /// callers that want an environment-driven bind address resolve the
    /// variable themselves and hand the result in.
    pub local_address: Option<IpAddr>,
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn proxy_host<S: Into<String>>(mut self, host: S) -> Self {
        self.proxy_host = Some(host.into());
        self
    }

    pub fn proxy_port(mut self, port: u16) -> Self {
        self.proxy_port = Some(port);
        self
    }

    pub fn local_address(mut self, addr: IpAddr) -> Self {
        self.local_address = Some(addr);
        self
    }
}

/// Resolved semantic address of a connection. Immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_address: Option<IpAddr>,
}

impl Endpoint {
    /// Resolve caller options into a dialable endpoint.
    ///
    /// `host` is the proxy host if given, else the direct host, else
    /// `localhost`; `port` follows the same rule with a default of 80. The
    /// path is always [`ENDPOINT_PATH`].
    pub fn resolve(options: &ConnectOptions) -> Self {
        Self {
            host: options
                .proxy_host
                .clone()
                .or_else(|| options.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: options.proxy_port.or(options.port).unwrap_or(DEFAULT_PORT),
            path: ENDPOINT_PATH,
            local_address: options.local_address,
        }
    }

    /// The request URI for this endpoint.
    pub fn uri(&self) -> Result<Uri, TransportError> {
        format!("http://{}:{}{}", self.host, self.port, self.path)
            .parse()
            .map_err(|e| TransportError::Request(format!("invalid endpoint uri: {e}")))
    }

    /// JSON rendition of the resolved options, kept for diagnostic
    /// reproduction in log output.
    pub fn diagnostic(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
