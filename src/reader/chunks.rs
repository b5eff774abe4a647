use bytes::Bytes;
use futures_core::Stream;
use std::{
    io, mem,
    pin::Pin,
    task::{Context, Poll},
};

use super::BufferedReader;

/// Stream over the remaining chunks of a [`BufferedReader`].
///
/// Returned from [`BufferedReader::chunks`].
#[derive(Debug)]
pub struct Chunks<'a, S> {
    reader: &'a mut BufferedReader<S>,
    /// Split point of buffered bytes, only applies to the first chunk.
    size_hint: usize,
}

impl<'a, S> Chunks<'a, S> {
    pub(super) fn new(reader: &'a mut BufferedReader<S>, size_hint: usize) -> Self {
        Self { reader, size_hint }
    }
}

impl<S> Chunks<'_, S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    /// Returns the next chunk, or `None` if the stream is exhausted.
    #[inline]
    pub async fn next(&mut self) -> Option<io::Result<Bytes>> {
        std::future::poll_fn(|cx| self.poll_next_chunk(cx)).await
    }

    fn poll_next_chunk(&mut self, cx: &mut Context) -> Poll<Option<io::Result<Bytes>>> {
        let size_hint = mem::take(&mut self.size_hint);
        if size_hint > 0 && size_hint < self.reader.buffered() {
            return Poll::Ready(Some(Ok(self.reader.deliver(size_hint))));
        }
        self.reader.poll_chunk(cx)
    }
}

impl<S> Stream for Chunks<'_, S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_next_chunk(cx)
    }
}
