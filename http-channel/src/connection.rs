//! Buffered half-duplex connection over HTTP request/response cycles.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use http::{Method, Request, StatusCode, Uri, header};
use http_body_util::BodyExt;
use tracing::{debug, error};

use crate::buffer::WriteBuffer;
use crate::builder::ConnectionBuilder;
use crate::config::{ConnectOptions, Endpoint};
use crate::error::TransportError;
use crate::transport::{HttpCapability, HyperTransport, TransportBody};

/// A buffered byte transport over HTTP.
///
/// Writes accumulate locally; the next [`read`](Connection::read) flushes
/// them as a single request body and resolves with the response payload.
/// Generic over the HTTP capability so tests can substitute a mock; the
/// default is the hyper-backed [`HyperTransport`].
///
/// The connection is single-caller by design: writes between two reads are
/// concatenated in call order, responses match 1:1 the read that triggered
/// them, and an overlapping read fails fast with
/// [`TransportError::ConcurrentRead`].
#[derive(Debug)]
pub struct Connection<C = HyperTransport> {
    endpoint: Endpoint,
    uri: Uri,
    capability: C,
    buffer: Mutex<WriteBuffer>,
    busy: AtomicBool,
    /// Resolved options as JSON, reproduced in diagnostics.
    config: String,
}

impl Connection<HyperTransport> {
    /// Create a builder for a connection backed by the default hyper
    /// transport.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Create a connection with default transport settings.
    pub fn new(options: ConnectOptions) -> Result<Self, TransportError> {
        Self::builder().options(options).build()
    }
}

impl<C: HttpCapability> Connection<C> {
    /// Create a connection that dispatches through the given capability.
    pub fn with_capability(options: ConnectOptions, capability: C) -> Result<Self, TransportError> {
        let endpoint = Endpoint::resolve(&options);
        let uri = endpoint.uri()?;
        let config = endpoint.diagnostic();
        debug!(config = %config, "created");
        Ok(Self {
            endpoint,
            uri,
            capability,
            buffer: Mutex::new(WriteBuffer::default()),
            busy: AtomicBool::new(false),
            config,
        })
    }

    /// The resolved endpoint this connection dials.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Total bytes currently buffered for the next flush.
    pub fn buffered_len(&self) -> usize {
        self.buffer().len()
    }

    /// Enter the connected state: reset the write buffer to empty.
    ///
    /// No network I/O happens here; the real socket is opened lazily by
    /// the capability inside [`read`](Connection::read). Idempotent, and
    /// harmless to an in-flight read, whose body was already taken.
    pub fn connect(&self) {
        self.buffer().clear();
        debug!(config = %self.config, "connected");
    }

    /// Append `data` to the write buffer for the next flush.
    ///
    /// Completes synchronously and never fails. There is no upper bound on
    /// the buffered size; the upper protocol's message-size ceiling is the
    /// caller's responsibility. An empty chunk is a no-op.
    pub fn write(&self, data: Bytes) {
        if data.is_empty() {
            return;
        }
        let mut buffer = self.buffer();
        let chunk = data.len();
        buffer.push(data);
        debug!(chunk, total = buffer.len(), "buffered write");
    }

    /// Flush the write buffer as one HTTP request and await the response
    /// payload.
    ///
    /// The request is a `POST` carrying the concatenation of all buffered
    /// writes, or an empty `GET` when nothing was written. The buffer is
    /// cleared when the request is dispatched, before the outcome is known:
    /// a failed cycle does not repopulate it, so a retrying caller must
    /// re-write its payload.
    ///
    /// # Errors
    ///
    /// * [`TransportError::ConcurrentRead`] if another read is in flight.
    /// * [`TransportError::Transport`] on connection/IO failure.
    /// * [`TransportError::Status`] when the server answers with a status
    ///   other than 200; the raw response body rides along as the error
    ///   payload.
    pub async fn read(&self) -> Result<Bytes, TransportError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(TransportError::ConcurrentRead);
        }
        let _slot = ReadSlot(&self.busy);

        let body = self.buffer().take();
        let method = if body.is_empty() { Method::GET } else { Method::POST };
        debug!(len = body.len(), config = %self.config, "writing request");

        let request = Request::builder()
            .method(method)
            .uri(self.uri.clone())
            .header(header::CONTENT_LENGTH, body.len())
            .header(header::CONNECTION, "keep-alive")
            // No Content-Type, no Accept: bodies are raw octets and the
            // server does not content-negotiate.
            .body(if body.is_empty() {
                TransportBody::empty()
            } else {
                TransportBody::full(body)
            })
            .map_err(|e| TransportError::Request(format!("failed to build request: {e}")))?;

        let response = match self.capability.send(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(config = %self.config, error = %e, "error reading");
                return Err(e);
            }
        };

        let status = response.status();
        debug!(status = %status, config = %self.config, "response received");

        let body = response.into_body().collect().await?.to_bytes();
        if status == StatusCode::OK {
            Ok(body)
        } else {
            Err(TransportError::Status { status, body })
        }
    }

    /// Close the connection.
    ///
    /// A completion signal only: the capability owns its keep-alive pool
    /// and there is nothing to tear down here.
    pub fn close(&self) {
        debug!(config = %self.config, "closed");
    }

    fn buffer(&self) -> std::sync::MutexGuard<'_, WriteBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the single in-flight-read slot when the read finishes or its
/// future is dropped.
struct ReadSlot<'a>(&'a AtomicBool);

impl Drop for ReadSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::{HeaderMap, Response};
    use http_body_util::Full;
    use tokio::sync::Notify;

    use super::*;
    use crate::transport::ResponseBody;

    #[derive(Debug, Clone)]
    struct Recorded {
        method: Method,
        headers: HeaderMap,
        body: Bytes,
    }

    #[derive(Debug, Clone)]
    enum Reply {
        Status(StatusCode, Bytes),
        Error(&'static str),
    }

    /// Capability that records every dispatched request and answers with a
    /// fixed reply.
    struct MockCapability {
        reply: Reply,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl MockCapability {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn requests(&self) -> Arc<Mutex<Vec<Recorded>>> {
            self.requests.clone()
        }
    }

    fn respond(status: StatusCode, body: Bytes) -> Response<ResponseBody> {
        Response::builder()
            .status(status)
            .body(Full::new(body).map_err(|e| match e {}).boxed())
            .unwrap()
    }

    impl HttpCapability for MockCapability {
        async fn send(
            &self,
            request: Request<TransportBody>,
        ) -> Result<Response<ResponseBody>, TransportError> {
            let (parts, body) = request.into_parts();
            let body = body.collect().await.unwrap().to_bytes();
            self.requests.lock().unwrap().push(Recorded {
                method: parts.method,
                headers: parts.headers,
                body,
            });
            match &self.reply {
                Reply::Status(status, body) => Ok(respond(*status, body.clone())),
                Reply::Error(msg) => Err(TransportError::Transport((*msg).to_string())),
            }
        }
    }

    fn connection(reply: Reply) -> (Connection<MockCapability>, Arc<Mutex<Vec<Recorded>>>) {
        let capability = MockCapability::new(reply);
        let requests = capability.requests();
        let conn = Connection::with_capability(ConnectOptions::new(), capability).unwrap();
        conn.connect();
        (conn, requests)
    }

    #[tokio::test]
    async fn writes_concatenate_in_call_order() {
        let (conn, requests) =
            connection(Reply::Status(StatusCode::OK, Bytes::from_static(b"ok")));
        conn.write(Bytes::from_static(b"abc"));
        conn.write(Bytes::from_static(b"de"));
        assert_eq!(conn.buffered_len(), 5);

        let reply = conn.read().await.unwrap();
        assert_eq!(reply, Bytes::from_static(b"ok"));

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].body, Bytes::from_static(b"abcde"));
        assert_eq!(requests[0].headers[header::CONTENT_LENGTH], "5");
        assert_eq!(requests[0].headers[header::CONNECTION], "keep-alive");
        assert!(!requests[0].headers.contains_key(header::CONTENT_TYPE));
        assert!(!requests[0].headers.contains_key(header::ACCEPT));
    }

    #[tokio::test]
    async fn read_without_writes_sends_empty_get() {
        let (conn, requests) =
            connection(Reply::Status(StatusCode::OK, Bytes::from_static(b"poll")));
        let reply = conn.read().await.unwrap();
        assert_eq!(reply, Bytes::from_static(b"poll"));

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].method, Method::GET);
        assert!(requests[0].body.is_empty());
        assert_eq!(requests[0].headers[header::CONTENT_LENGTH], "0");
    }

    #[tokio::test]
    async fn non_200_status_carries_body_as_error() {
        let (conn, _) = connection(Reply::Status(
            StatusCode::NOT_FOUND,
            Bytes::from_static(b"gone away"),
        ));
        conn.write(Bytes::from_static(b"x"));
        let err = conn.read().await.unwrap_err();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, Bytes::from_static(b"gone away"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_surfaces_once() {
        let (conn, _) = connection(Reply::Error("connection refused"));
        conn.write(Bytes::from_static(b"x"));
        let err = conn.read().await.unwrap_err();
        assert!(matches!(err, TransportError::Transport(msg) if msg == "connection refused"));
    }

    #[tokio::test]
    async fn buffer_is_cleared_even_when_the_read_fails() {
        let (conn, requests) = connection(Reply::Error("reset"));
        conn.write(Bytes::from_static(b"abc"));
        conn.read().await.unwrap_err();
        assert_eq!(conn.buffered_len(), 0);

        // A retry without re-writing goes out as an empty GET.
        conn.read().await.unwrap_err();
        let requests = requests.lock().unwrap();
        assert_eq!(requests[1].method, Method::GET);
        assert!(requests[1].body.is_empty());
    }

    #[tokio::test]
    async fn connect_is_idempotent_and_resets_the_buffer() {
        let (conn, requests) =
            connection(Reply::Status(StatusCode::OK, Bytes::new()));
        conn.connect();
        assert_eq!(conn.buffered_len(), 0);
        conn.connect();
        assert_eq!(conn.buffered_len(), 0);

        conn.write(Bytes::from_static(b"stale"));
        conn.connect();
        assert_eq!(conn.buffered_len(), 0);

        conn.read().await.unwrap();
        assert_eq!(requests.lock().unwrap()[0].method, Method::GET);
    }

    #[tokio::test]
    async fn empty_write_is_a_no_op() {
        let (conn, requests) =
            connection(Reply::Status(StatusCode::OK, Bytes::new()));
        conn.write(Bytes::new());
        assert_eq!(conn.buffered_len(), 0);
        conn.read().await.unwrap();
        assert_eq!(requests.lock().unwrap()[0].method, Method::GET);
    }

    /// Capability that parks until released, so a read can be held in
    /// flight deliberately.
    struct ParkedCapability {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl HttpCapability for ParkedCapability {
        async fn send(
            &self,
            _request: Request<TransportBody>,
        ) -> Result<Response<ResponseBody>, TransportError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(respond(StatusCode::OK, Bytes::new()))
        }
    }

    #[tokio::test]
    async fn concurrent_read_fails_fast_and_slot_is_released() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let capability = ParkedCapability {
            entered: entered.clone(),
            release: release.clone(),
        };
        let conn =
            Arc::new(Connection::with_capability(ConnectOptions::new(), capability).unwrap());

        let first = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.read().await })
        };
        entered.notified().await;

        // Second read while the first is parked inside the capability.
        let err = conn.read().await.unwrap_err();
        assert!(matches!(err, TransportError::ConcurrentRead));

        release.notify_one();
        first.await.unwrap().unwrap();

        // Slot is free again once the first read completed.
        let second = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.read().await })
        };
        entered.notified().await;
        release.notify_one();
        second.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn dropping_an_in_flight_read_releases_the_slot() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let capability = ParkedCapability {
            entered: entered.clone(),
            release: release.clone(),
        };
        let conn =
            Arc::new(Connection::with_capability(ConnectOptions::new(), capability).unwrap());

        let first = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.read().await })
        };
        entered.notified().await;
        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());

        let second = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.read().await })
        };
        entered.notified().await;
        release.notify_one();
        second.await.unwrap().unwrap();
    }
}
