use bytes::{BufMut, Bytes, BytesMut};
use futures_core::Stream;
use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};
use tokio::io::AsyncRead;
use tokio_util::io::poll_read_buf;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::log::trace;

/// Source reading chunks from an [`AsyncRead`].
///
/// Each chunk holds at most `capacity` bytes, the source ends when the reader returns zero bytes.
#[derive(Debug)]
pub struct IoSource<R> {
    io: R,
    buffer: BytesMut,
    capacity: usize,
    done: bool,
}

impl<R> IoSource<R> {
    /// Create new [`IoSource`] reading up to [`DEFAULT_CHUNK_SIZE`] bytes per chunk.
    #[inline]
    pub fn new(io: R) -> Self {
        Self::with_capacity(io, DEFAULT_CHUNK_SIZE)
    }

    /// Create new [`IoSource`] reading up to `capacity` bytes per chunk.
    pub fn with_capacity(io: R, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            io,
            buffer: BytesMut::with_capacity(capacity),
            capacity,
            done: false,
        }
    }

    /// Returns a reference to the underlying reader.
    #[inline]
    pub fn get_ref(&self) -> &R {
        &self.io
    }

    /// Consumes the source, returning the underlying reader.
    #[inline]
    pub fn into_inner(self) -> R {
        self.io
    }
}

impl<R> Stream for IoSource<R>
where
    R: AsyncRead + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.get_mut();

        if me.done {
            return Poll::Ready(None);
        }

        me.buffer.reserve(me.capacity);

        let mut buf = (&mut me.buffer).limit(me.capacity);
        let read = match ready!(poll_read_buf(Pin::new(&mut me.io), cx, &mut buf)) {
            Ok(read) => read,
            Err(err) => return Poll::Ready(Some(Err(err))),
        };

        if read == 0 {
            trace!("io source reached end of file");
            me.done = true;
            return Poll::Ready(None);
        }

        Poll::Ready(Some(Ok(me.buffer.split_to(read).freeze())))
    }
}
