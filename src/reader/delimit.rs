use bytes::Bytes;
use futures_core::Stream;
use memchr::memmem::Finder;
use std::{
    cmp, io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use super::BufferedReader;
use crate::config::Config;
use crate::destination::Destination;
use crate::error::ReadError;
use crate::log::warning;

/// Outcome of a delimiter scan over undelivered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Delimiter starts at given offset.
    Found(usize),
    /// Given number of leading bytes can not be part of a delimiter.
    Partial(usize),
    /// Source exhausted without a delimiter, given number of bytes remains.
    End(usize),
}

impl Scan {
    fn len(self) -> usize {
        match self {
            Scan::Found(n) | Scan::Partial(n) | Scan::End(n) => n,
        }
    }
}

impl<S> BufferedReader<S> {
    fn check_delimiter(&self, delimiter: &[u8]) -> Result<(), ReadError> {
        let len = delimiter.len();
        if len == 0 || len > self.chunk_size {
            return Err(ReadError::InvalidArgument {
                len,
                chunk_size: self.chunk_size,
            });
        }
        Ok(())
    }
}

impl<S> BufferedReader<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    /// Scan undelivered bytes for `delimiter`, pulling chunks as required.
    ///
    /// `scanned` is the number of leading undelivered bytes known to not start a delimiter, it
    /// is kept across polls so bytes are not searched twice. The last `delimiter.len() - 1`
    /// buffered bytes are searched again together with the next chunk, which finds delimiters
    /// straddling a chunk boundary.
    ///
    /// If `flush_at` is set, [`Scan::Partial`] is returned as soon as that many bytes are known
    /// delimiter free.
    fn poll_scan(
        &mut self,
        cx: &mut Context,
        finder: &Finder<'_>,
        scanned: &mut usize,
        flush_at: Option<usize>,
    ) -> Poll<io::Result<Scan>> {
        let delimiter = finder.needle();
        loop {
            let unread = self.unread();

            if let Some(at) = finder.find(&unread[*scanned..]) {
                *scanned += at;
                return Poll::Ready(Ok(Scan::Found(*scanned)));
            }

            let len = unread.len();
            *scanned = cmp::max(*scanned, len.saturating_sub(delimiter.len() - 1));

            if self.source.is_exhausted() {
                return Poll::Ready(Ok(Scan::End(len)));
            }

            if flush_at.is_some_and(|at| *scanned >= at) {
                return Poll::Ready(Ok(Scan::Partial(*scanned)));
            }

            // on exhaustion, the next iteration returns `Scan::End`
            ready!(self.poll_fill(cx))?;
        }
    }

    /// Fill the buffer past `offset + delimiter.len()` and check whether `delimiter` follows the
    /// first `offset` undelivered bytes. Nothing is delivered.
    fn poll_delimiter_at(
        &mut self,
        cx: &mut Context,
        offset: usize,
        delimiter: &[u8],
    ) -> Poll<io::Result<bool>> {
        ready!(self.poll_fill_to(cx, offset + delimiter.len()))?;
        Poll::Ready(Ok(self.unread()[offset..].starts_with(delimiter)))
    }

    /// Read bytes up to, but excluding, `delimiter`.
    ///
    /// If `size` is set, at most `size` bytes are returned and the scan stops as soon as `size`
    /// bytes before the delimiter are known. If the source is exhausted before the delimiter is
    /// found, the rest of the stream is returned.
    ///
    /// A stream starting with `delimiter` returns empty bytes.
    ///
    /// With `consume_delimiter`, the delimiter is checked before anything is delivered, a
    /// cancelled call leaves every byte in place.
    ///
    /// # Errors
    ///
    /// [`ReadError::InvalidArgument`] if delimiter length is not within `[1, chunk_size]`.
    ///
    /// [`ReadError::DelimiterMissing`] if `consume_delimiter` is `true` but the bytes following
    /// the result are not `delimiter`.
    pub async fn read_until(
        &mut self,
        delimiter: impl AsRef<[u8]>,
        size: Option<usize>,
        consume_delimiter: bool,
    ) -> Result<Bytes, ReadError> {
        let delimiter = delimiter.as_ref();
        self.check_delimiter(delimiter)?;

        let n = match size {
            Some(0) => 0,
            _ => {
                let finder = Finder::new(delimiter);
                let mut scanned = 0;
                let scan =
                    std::future::poll_fn(|cx| self.poll_scan(cx, &finder, &mut scanned, size))
                        .await?;
                let n = scan.len();
                size.map_or(n, |size| cmp::min(n, size))
            }
        };

        if !consume_delimiter {
            return Ok(self.deliver(n));
        }

        let found = std::future::poll_fn(|cx| self.poll_delimiter_at(cx, n, delimiter)).await?;

        // the result is consumed even if the delimiter is missing
        let result = self.deliver(n);

        if !found {
            warning!("expected delimiter missing, {} bytes remaining", self.buffered());
            return Err(ReadError::DelimiterMissing);
        }

        self.skip(delimiter.len());
        Ok(result)
    }

    /// Advance past `delimiter`.
    ///
    /// # Errors
    ///
    /// [`ReadError::DelimiterMissing`] if the stream does not continue with `delimiter`, for
    /// example if it is exhausted before the delimiter.
    pub async fn consume_delimiter(&mut self, delimiter: impl AsRef<[u8]>) -> Result<(), ReadError> {
        let delimiter = delimiter.as_ref();
        self.check_delimiter(delimiter)?;

        let found = std::future::poll_fn(|cx| self.poll_delimiter_at(cx, 0, delimiter)).await?;

        if !found {
            warning!("expected delimiter missing, {} bytes remaining", self.buffered());
            return Err(ReadError::DelimiterMissing);
        }

        self.skip(delimiter.len());
        Ok(())
    }

    /// Write bytes up to, but excluding, `delimiter` to `destination`.
    ///
    /// Bytes are written as soon as they are known to precede the delimiter. A chunk is removed
    /// from the reader before it is written, cancelling the call during a write loses that chunk.
    pub async fn pipe_until<D>(
        &mut self,
        delimiter: impl AsRef<[u8]>,
        destination: &mut D,
        consume_delimiter: bool,
    ) -> Result<(), ReadError>
    where
        D: Destination + ?Sized,
    {
        let delimiter = delimiter.as_ref();
        self.check_delimiter(delimiter)?;

        let mut scanner = Scanner::new(delimiter);

        while let Some(chunk) = std::future::poll_fn(|cx| scanner.poll_next(self, cx)).await {
            destination.write(chunk?).await?;
        }

        if consume_delimiter {
            self.consume_delimiter(delimiter).await?;
        }

        Ok(())
    }

    /// Create a reader over bytes up to, but excluding, `delimiter`.
    ///
    /// The returned reader borrows this reader and has the same configuration. Bytes it pulls are
    /// consumed from this reader, the delimiter itself is left in place.
    ///
    /// ```
    /// # async fn app() -> Result<(), body_reader::ReadError> {
    /// # let body = futures_util::stream::iter([
    /// #     Ok::<_, std::io::Error>(body_reader::Bytes::from_static(b"part-1--part-2")),
    /// # ]);
    /// use body_reader::BufferedReader;
    ///
    /// let mut reader = BufferedReader::new(body);
    ///
    /// let mut part = reader.delimit(b"--")?;
    /// assert_eq!(part.read_all().await?, "part-1");
    ///
    /// reader.consume_delimiter(b"--").await?;
    /// assert_eq!(reader.read_all().await?, "part-2");
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// [`ReadError::InvalidArgument`] if delimiter length is not within `[1, chunk_size]`.
    pub fn delimit(
        &mut self,
        delimiter: impl AsRef<[u8]>,
    ) -> Result<BufferedReader<Delimited<'_, S>>, ReadError> {
        let delimiter = delimiter.as_ref();
        self.check_delimiter(delimiter)?;

        let config = Config::new()
            .chunk_size(self.chunk_size)
            .max_join_chunks(self.max_join_size / self.chunk_size);

        let delimited = Delimited {
            scanner: Scanner::new(delimiter),
            reader: self,
        };

        Ok(BufferedReader::with_config(delimited, config))
    }
}

// ===== Scanner =====

/// Streaming delimiter scan state.
#[derive(Debug)]
struct Scanner {
    finder: Finder<'static>,
    scanned: usize,
    done: bool,
    found: bool,
}

impl Scanner {
    fn new(delimiter: &[u8]) -> Self {
        Self {
            finder: Finder::new(delimiter).into_owned(),
            scanned: 0,
            done: false,
            found: false,
        }
    }

    /// Poll the next chunk preceding the delimiter.
    fn poll_next<S>(
        &mut self,
        reader: &mut BufferedReader<S>,
        cx: &mut Context,
    ) -> Poll<Option<io::Result<Bytes>>>
    where
        S: Stream<Item = io::Result<Bytes>> + Unpin,
    {
        if self.done {
            return Poll::Ready(None);
        }

        let scan = match ready!(reader.poll_scan(cx, &self.finder, &mut self.scanned, Some(1))) {
            Ok(scan) => scan,
            Err(err) => return Poll::Ready(Some(Err(err))),
        };

        match scan {
            Scan::Partial(_) => {}
            Scan::Found(_) => {
                self.done = true;
                self.found = true;
            }
            Scan::End(_) => self.done = true,
        }

        let n = scan.len();
        self.scanned = 0;

        if n == 0 {
            return Poll::Ready(None);
        }

        Poll::Ready(Some(Ok(reader.deliver(n))))
    }
}

// ===== Delimited =====

/// Source of a [`BufferedReader`] created by [`BufferedReader::delimit`].
///
/// Yields the parent's bytes preceding the delimiter.
#[derive(Debug)]
pub struct Delimited<'a, S> {
    reader: &'a mut BufferedReader<S>,
    scanner: Scanner,
}

impl<S> Delimited<'_, S> {
    /// Returns `true` if the delimiter, or the end of the parent stream, is reached.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.scanner.done
    }

    /// Returns `true` if the delimiter is reached.
    ///
    /// Returns `false` while bytes remain, or if the parent stream ended without the delimiter.
    #[inline]
    pub fn found_delimiter(&self) -> bool {
        self.scanner.found
    }
}

impl<S> Stream for Delimited<'_, S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = self.get_mut();
        me.scanner.poll_next(me.reader, cx)
    }
}
