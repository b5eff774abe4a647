//! Buffered reader over an asynchronous byte source.
//!
//! [`BufferedReader`] pulls chunks from a source through a normalizer that coalesces small
//! chunks into chunks of at least `chunk_size` bytes. Pulled bytes that are not yet delivered are
//! kept in an owned buffer with a read cursor, which makes peeking, partial reads and delimiter
//! scanning possible without re-reading the source.
//!
//! Every operation commits its progress into the buffer before suspending. Dropping an operation
//! future never loses bytes already pulled from the source.
use bytes::{Buf, Bytes, BytesMut};
use futures_core::Stream;
use std::{
    cmp, io,
    task::{Context, Poll, ready},
};

use crate::config::Config;
use crate::destination::Destination;
use crate::error::ReadError;
use crate::log::warning;
use crate::source::IoSource;

mod normalize;
mod delimit;
mod chunks;
mod compat;

pub use chunks::Chunks;
pub use delimit::Delimited;

use normalize::Normalized;


/// File-like reader over an asynchronous [`Stream`] of byte chunks.
///
/// The reader is single consumer, operations take `&mut self` and are driven by the caller, no
/// task is spawned.
///
/// ```
/// # async fn app() -> Result<(), body_reader::ReadError> {
/// # let body = futures_util::stream::iter([
/// #     Ok::<_, std::io::Error>(body_reader::Bytes::from_static(b"foo\r\nbar")),
/// # ]);
/// use body_reader::BufferedReader;
///
/// let mut reader = BufferedReader::new(body);
///
/// assert_eq!(reader.read_until(b"\r\n", None, true).await?, "foo");
/// assert_eq!(reader.read_all().await?, "bar");
/// assert!(reader.eof());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BufferedReader<S> {
    source: Normalized<S>,
    /// Bytes pulled from the source, `buffer[..pos]` is already delivered.
    buffer: BytesMut,
    pos: usize,
    chunk_size: usize,
    max_join_size: usize,
    iteration_started: bool,
}

// ===== Constructor =====

impl<S> BufferedReader<S> {
    /// Create new [`BufferedReader`] with default [`Config`].
    #[inline]
    pub fn new(source: S) -> Self {
        Self::with_config(source, Config::new())
    }

    /// Create new [`BufferedReader`] with given minimum chunk size.
    ///
    /// Zero means [`DEFAULT_CHUNK_SIZE`][crate::DEFAULT_CHUNK_SIZE].
    #[inline]
    pub fn with_chunk_size(source: S, chunk_size: usize) -> Self {
        Self::with_config(source, Config::new().chunk_size(chunk_size))
    }

    /// Create new [`BufferedReader`] with given [`Config`].
    pub fn with_config(source: S, config: Config) -> Self {
        let chunk_size = config.get_chunk_size();
        Self {
            source: Normalized::new(source, chunk_size),
            buffer: BytesMut::new(),
            pos: 0,
            chunk_size,
            max_join_size: config.max_join_size(),
            iteration_started: false,
        }
    }
}

impl<R> BufferedReader<IoSource<R>> {
    /// Create new [`BufferedReader`] reading from an [`AsyncRead`][tokio::io::AsyncRead].
    #[inline]
    pub fn from_async_read(io: R) -> Self {
        Self::new(IoSource::new(io))
    }
}

// ===== Ref =====

impl<S> BufferedReader<S> {
    /// Returns the minimum size of chunks pulled from the source.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns a reference to the underlying source.
    #[inline]
    pub fn get_ref(&self) -> &S {
        self.source.get_ref()
    }

    /// Returns `true` if the source is exhausted and every buffered byte is delivered.
    #[inline]
    pub fn eof(&self) -> bool {
        self.source.is_exhausted() && self.buffered() == 0
    }

    /// Returns the number of bytes delivered so far.
    #[inline]
    pub fn tell(&self) -> u64 {
        self.source.consumed() - self.buffered() as u64
    }

    /// Returns `true` always.
    #[inline]
    pub fn readable(&self) -> bool {
        true
    }

    /// Returns `false` always.
    #[inline]
    pub fn writable(&self) -> bool {
        false
    }

    /// Returns `false` always.
    #[inline]
    pub fn seekable(&self) -> bool {
        false
    }

    /// Returns `false` always.
    #[inline]
    pub fn isatty(&self) -> bool {
        false
    }

    /// Returns an error always, the reader is not backed by a file descriptor.
    pub fn fileno(&self) -> io::Result<i32> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "reader does not use a file descriptor",
        ))
    }
}

// ===== Buffer =====

impl<S> BufferedReader<S> {
    /// Number of buffered bytes not yet delivered.
    #[inline]
    fn buffered(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Undelivered bytes.
    #[inline]
    fn unread(&self) -> &[u8] {
        &self.buffer[self.pos..]
    }

    /// Drop delivered bytes.
    fn trim_buffer(&mut self) {
        if self.pos > 0 {
            self.buffer.advance(self.pos);
            self.pos = 0;
        }
    }

    /// Put `chunk` in front of undelivered bytes.
    fn prepend_buffer(&mut self, chunk: Bytes) {
        if self.buffered() > 0 {
            let mut buffer = BytesMut::with_capacity(chunk.len() + self.buffered());
            buffer.extend_from_slice(&chunk);
            buffer.extend_from_slice(self.unread());
            self.buffer = buffer;
        } else {
            self.buffer.clear();
            self.buffer.extend_from_slice(&chunk);
        }
        self.pos = 0;
    }

    /// Deliver `n` undelivered bytes.
    fn deliver(&mut self, n: usize) -> Bytes {
        debug_assert!(n <= self.buffered());
        self.trim_buffer();
        self.buffer.split_to(n).freeze()
    }

    /// Skip `n` undelivered bytes.
    fn skip(&mut self, n: usize) {
        debug_assert!(n <= self.buffered());
        self.pos += n;
    }
}

// ===== Poll =====

impl<S> BufferedReader<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    /// Pull one chunk into the buffer, returns `false` if the source is exhausted.
    fn poll_fill(&mut self, cx: &mut Context) -> Poll<io::Result<bool>> {
        self.trim_buffer();
        match ready!(self.source.poll_next(cx)) {
            Some(Ok(chunk)) => {
                self.buffer.extend_from_slice(&chunk);
                Poll::Ready(Ok(true))
            }
            Some(Err(err)) => Poll::Ready(Err(err)),
            None => Poll::Ready(Ok(false)),
        }
    }

    /// Fill the buffer until at least `n` bytes are undelivered or the source is exhausted.
    fn poll_fill_to(&mut self, cx: &mut Context, n: usize) -> Poll<io::Result<()>> {
        while self.buffered() < n {
            if !ready!(self.poll_fill(cx))? {
                break;
            }
        }
        Poll::Ready(Ok(()))
    }

    /// Poll the next chunk of the remaining stream, buffered bytes first.
    fn poll_chunk(&mut self, cx: &mut Context) -> Poll<Option<io::Result<Bytes>>> {
        if self.buffered() > 0 {
            let n = self.buffered();
            return Poll::Ready(Some(Ok(self.deliver(n))));
        }
        self.source.poll_next(cx)
    }

    fn poll_read_sized(&mut self, cx: &mut Context, size: usize) -> Poll<Result<Bytes, ReadError>> {
        loop {
            let buffered = self.buffered();

            if buffered >= size {
                return Poll::Ready(Ok(self.deliver(size)));
            }

            if buffered == 0 {
                // nothing buffered, a large enough chunk is returned without copy
                let mut chunk = match ready!(self.source.poll_next(cx)) {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(err)) => return Poll::Ready(Err(err.into())),
                    None => return Poll::Ready(Ok(Bytes::new())),
                };

                if chunk.len() >= size {
                    let head = chunk.split_to(size);
                    if !chunk.is_empty() {
                        self.prepend_buffer(chunk);
                    }
                    return Poll::Ready(Ok(head));
                }

                self.trim_buffer();
                self.reserve_for(size);
                self.buffer.extend_from_slice(&chunk);
                continue;
            }

            self.trim_buffer();
            self.reserve_for(size);

            if !ready!(self.poll_fill(cx))? {
                let n = self.buffered();
                return Poll::Ready(Ok(self.deliver(n)));
            }
        }
    }

    /// Reads up to `max_join_size` are allocated once, larger reads grow with arriving chunks.
    fn reserve_for(&mut self, size: usize) {
        if size <= self.max_join_size {
            self.buffer.reserve(size.saturating_sub(self.buffer.len()));
        }
    }

    fn poll_read_all(&mut self, cx: &mut Context) -> Poll<Result<Bytes, ReadError>> {
        while ready!(self.poll_fill(cx))? {}
        let n = self.buffered();
        Poll::Ready(Ok(self.deliver(n)))
    }
}

// ===== Read =====

impl<S> BufferedReader<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    /// Read up to `size` bytes.
    ///
    /// Returns exactly `size` bytes unless the source is exhausted first. Zero returns empty
    /// bytes without reading the source, use [`read_all`][Self::read_all] to read until the source
    /// is exhausted.
    ///
    /// Consecutive reads return the same bytes as a single read of the total size.
    pub async fn read(&mut self, size: usize) -> Result<Bytes, ReadError> {
        if size == 0 {
            return Ok(Bytes::new());
        }
        std::future::poll_fn(|cx| self.poll_read_sized(cx, size)).await
    }

    /// Read and return all remaining data.
    ///
    /// Returns empty bytes if the stream is already consumed.
    pub async fn read_all(&mut self) -> Result<Bytes, ReadError> {
        std::future::poll_fn(|cx| self.poll_read_all(cx)).await
    }

    /// Returns up to `size` bytes from the front of the stream without consuming them.
    ///
    /// `size` is capped at the chunk size.
    pub async fn peek(&mut self, size: usize) -> Result<Bytes, ReadError> {
        let size = cmp::min(size, self.chunk_size);

        self.trim_buffer();
        std::future::poll_fn(|cx| self.poll_fill_to(cx, size)).await?;

        let n = cmp::min(size, self.buffered());
        Ok(Bytes::copy_from_slice(&self.unread()[..n]))
    }

    /// Write every remaining byte to `destination`, in order.
    ///
    /// A chunk is removed from the reader before it is written, cancelling the call during a
    /// write loses that chunk.
    pub async fn pipe<D>(&mut self, destination: &mut D) -> Result<(), ReadError>
    where
        D: Destination + ?Sized,
    {
        while let Some(chunk) = std::future::poll_fn(|cx| self.poll_chunk(cx)).await {
            destination.write(chunk?).await?;
        }
        Ok(())
    }

    /// Read and discard the rest of the stream.
    pub async fn exhaust(&mut self) -> Result<(), ReadError> {
        self.pipe(&mut tokio::io::sink()).await
    }

    /// Iterate over the remaining stream.
    ///
    /// Buffered bytes are yielded first as one chunk, followed by normalized chunks from the
    /// source.
    ///
    /// # Errors
    ///
    /// Iteration can only be started once, [`ReadError::OperationNotAllowed`] is returned on the
    /// second call.
    #[inline]
    pub fn chunks(&mut self) -> Result<Chunks<'_, S>, ReadError> {
        self.chunks_with_hint(0)
    }

    /// Iterate over the remaining stream, splitting buffered bytes at `size_hint`.
    ///
    /// If more than `size_hint` bytes are buffered, the first `size_hint` bytes are yielded as a
    /// separate chunk. Zero disables the split, same as [`chunks`][Self::chunks].
    ///
    /// # Errors
    ///
    /// Iteration can only be started once, [`ReadError::OperationNotAllowed`] is returned on the
    /// second call.
    pub fn chunks_with_hint(&mut self, size_hint: usize) -> Result<Chunks<'_, S>, ReadError> {
        if self.iteration_started {
            warning!("reader iterated more than once");
            return Err(ReadError::OperationNotAllowed);
        }
        self.iteration_started = true;
        Ok(Chunks::new(self, size_hint))
    }
}
