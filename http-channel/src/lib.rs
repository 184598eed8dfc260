//! Buffered half-duplex byte transport over HTTP request/response cycles.
//!
//! This crate lets an upper-layer binary protocol exchange opaque byte
//! payloads over plain HTTP, simulating a persistent bidirectional channel
//! on top of stateless request/response semantics. The protocol layer
//! serializes its messages into raw buffers; this crate only ever sees
//! bytes in and bytes out.
//!
//! ## Model
//!
//! A [`Connection`] accumulates outbound bytes via [`write`](Connection::write)
//! and flushes them as the body of a single HTTP request on the next
//! [`read`](Connection::read). When nothing was written the request is an
//! empty `GET` (a pure poll); otherwise it is a `POST` carrying the
//! concatenation of all buffered writes in call order. The response body is
//! handed back to the caller verbatim on status 200; any other status or
//! transport failure surfaces as a [`TransportError`].
//!
//! At most one `read` may be in flight per connection. A second concurrent
//! `read` fails fast with [`TransportError::ConcurrentRead`] instead of
//! racing the first.
//!
//! ## Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http_channel::Connection;
//!
//! # async fn run() -> Result<(), http_channel::TransportError> {
//! let conn = Connection::builder()
//!     .host("173.240.5.253")
//!     .port(443)
//!     .build()?;
//!
//! conn.connect();
//! conn.write(Bytes::from_static(&[0x01, 0x02, 0x03]));
//! let reply = conn.read().await?;
//! conn.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## What this crate does not do
//!
//! No retries, no timeouts, no message framing: every failure is surfaced
//! exactly once per `read` and the upper protocol layer owns recovery. The
//! write buffer is cleared when the request is dispatched, so a caller that
//! wants to retry after an error must re-write its payload first.

mod buffer;
mod builder;
mod config;
mod connection;
mod error;
pub mod transport;

pub use builder::ConnectionBuilder;
pub use config::{ConnectOptions, ENDPOINT_PATH, Endpoint};
pub use connection::Connection;
pub use error::TransportError;
pub use transport::{HttpCapability, HyperTransport, ResponseBody, TransportBody};
