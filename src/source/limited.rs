use bytes::Bytes;
use futures_core::Stream;
use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use crate::log::debug;

/// Source that yields at most `limit` bytes from an inner source.
///
/// The chunk crossing the limit is truncated and the inner source is never polled again, so a
/// body reader does not wait for bytes past the declared length of a message.
#[derive(Debug)]
pub struct Limited<S> {
    inner: S,
    remaining: u64,
}

impl<S> Limited<S> {
    /// Create new [`Limited`] source.
    #[inline]
    pub fn new(inner: S, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }

    /// Returns the number of bytes that may still be yielded.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Consumes the source, returning the inner source.
    #[inline]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Stream for Limited<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.get_mut();

        if me.remaining == 0 {
            return Poll::Ready(None);
        }

        let mut chunk = match ready!(Pin::new(&mut me.inner).poll_next(cx)) {
            Some(Ok(chunk)) => chunk,
            other => return Poll::Ready(other),
        };

        let len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);

        if len > me.remaining {
            debug!("source truncated at limit, {} bytes dropped", len - me.remaining);
            // `remaining < len <= usize::MAX`
            chunk.truncate(me.remaining as usize);
            me.remaining = 0;
        } else {
            me.remaining -= len;
        }

        Poll::Ready(Some(Ok(chunk)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            (0, Some(0))
        } else {
            (0, self.inner.size_hint().1)
        }
    }
}
