use bytes::Bytes;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Sink of byte chunks used by [`BufferedReader::pipe`] and [`BufferedReader::pipe_until`].
///
/// Any [`AsyncWrite`] is a destination. [`tokio::io::Sink`] discards everything.
///
/// [`BufferedReader::pipe`]: crate::BufferedReader::pipe
/// [`BufferedReader::pipe_until`]: crate::BufferedReader::pipe_until
pub trait Destination {
    /// Hand off `chunk`, completing once it is fully written.
    fn write(&mut self, chunk: Bytes) -> impl Future<Output = io::Result<()>>;
}

impl<W> Destination for W
where
    W: AsyncWrite + Unpin + ?Sized,
{
    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        self.write_all(&chunk).await
    }
}
