//! HTTP capability seam.
//!
//! The connection never implements HTTP itself: it hands a fully-formed
//! request to an [`HttpCapability`] and classifies whatever comes back.
//! [`HyperTransport`] is the production capability, built on hyper_util's
//! legacy pooling client; tests substitute a mock.

use std::future::Future;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;

use crate::error::TransportError;

mod body;
mod hyper;

pub use body::TransportBody;
pub use hyper::{HyperTransport, HyperTransportBuilder};

/// Response body as delivered by a capability: boxed so mocks and the real
/// hyper client meet the same signature.
pub type ResponseBody = BoxBody<Bytes, TransportError>;

/// A black-box HTTP engine: send method+headers+body, asynchronously
/// deliver status+headers+body or an I/O error.
///
/// Implementations own their socket lifecycle (keep-alive pooling
/// included); the connection never tears sockets down itself.
pub trait HttpCapability {
    fn send(
        &self,
        request: http::Request<TransportBody>,
    ) -> impl Future<Output = Result<http::Response<ResponseBody>, TransportError>> + Send;
}
