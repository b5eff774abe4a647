use bytes::Bytes;
use futures_core::Stream;
use std::{
    cmp, io,
    pin::Pin,
    task::{Context, Poll, ready},
};
use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

use super::BufferedReader;

impl<S> AsyncBufRead for BufferedReader<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        let me = self.get_mut();
        if me.buffered() == 0 {
            ready!(me.poll_fill(cx))?;
        }
        Poll::Ready(Ok(me.unread()))
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        let me = self.get_mut();
        me.pos = cmp::min(me.pos + amt, me.buffer.len());
    }
}

impl<S> AsyncRead for BufferedReader<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let unread = ready!(self.as_mut().poll_fill_buf(cx))?;
        let n = cmp::min(unread.len(), buf.remaining());
        buf.put_slice(&unread[..n]);
        self.consume(n);
        Poll::Ready(Ok(()))
    }
}
