//! Write buffering with byte accounting.

use bytes::{Bytes, BytesMut};

/// Ordered queue of outbound byte chunks plus their running total length.
///
/// Invariant: `len` always equals the sum of the chunk lengths. The total
/// decides the HTTP method of the next flush (GET when zero, POST
/// otherwise) and sizes the single concatenation performed by [`take`].
///
/// [`take`]: WriteBuffer::take
#[derive(Debug, Default)]
pub(crate) struct WriteBuffer {
    chunks: Vec<Bytes>,
    len: usize,
}

impl WriteBuffer {
    pub(crate) fn push(&mut self, data: Bytes) {
        self.len += data.len();
        self.chunks.push(data);
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    /// Concatenate all buffered chunks into one contiguous body and reset
    /// the buffer to empty.
    ///
    /// A single-chunk buffer hands its `Bytes` back without copying. The
    /// concatenation happens exactly once per flush.
    pub(crate) fn take(&mut self) -> Bytes {
        self.len = 0;
        if self.chunks.len() <= 1 {
            return self.chunks.pop().unwrap_or_default();
        }
        let mut body = BytesMut::with_capacity(self.chunks.iter().map(Bytes::len).sum());
        for chunk in self.chunks.drain(..) {
            body.extend_from_slice(&chunk);
        }
        body.freeze()
    }
}
