use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use std::{
    io, mem,
    pin::Pin,
    task::{Context, Poll, ready},
};

use crate::log::{debug, trace};

/// Re-chunk a source so every chunk except the last is at least `chunk_size` bytes.
#[derive(Debug)]
pub(crate) struct Normalized<S> {
    source: S,
    pending: Pending,
    chunk_size: usize,
    /// Total bytes emitted.
    consumed: u64,
    exhausted: bool,
}

/// Accumulated bytes, a single source chunk is emitted without copy.
#[derive(Debug, Default)]
enum Pending {
    #[default]
    None,
    Ref(Bytes),
    Mut(BytesMut),
}

impl Pending {
    fn len(&self) -> usize {
        match self {
            Pending::None => 0,
            Pending::Ref(bytes) => bytes.len(),
            Pending::Mut(bytes) => bytes.len(),
        }
    }

    fn push(&mut self, chunk: Bytes, chunk_size: usize) {
        match self {
            Pending::None => *self = Pending::Ref(chunk),
            Pending::Ref(bytes) => {
                // more than one chunk, concatenation requires copy
                let mut bytesm = BytesMut::with_capacity(chunk_size.max(bytes.len() + chunk.len()));
                bytesm.extend_from_slice(bytes);
                bytesm.extend_from_slice(&chunk);
                *self = Pending::Mut(bytesm);
            }
            Pending::Mut(bytesm) => bytesm.extend_from_slice(&chunk),
        }
    }

    fn take(&mut self) -> Bytes {
        match mem::take(self) {
            Pending::None => Bytes::new(),
            Pending::Ref(bytes) => bytes,
            Pending::Mut(bytesm) => bytesm.freeze(),
        }
    }
}

impl<S> Normalized<S> {
    pub(crate) fn new(source: S, chunk_size: usize) -> Self {
        Self {
            source,
            pending: Pending::None,
            chunk_size,
            consumed: 0,
            exhausted: false,
        }
    }

    pub(crate) fn get_ref(&self) -> &S {
        &self.source
    }

    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn emit(&mut self) -> Bytes {
        let chunk = self.pending.take();
        self.consumed += chunk.len() as u64;
        chunk
    }
}

impl<S> Normalized<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    /// Poll the next normalized chunk.
    ///
    /// Accumulated bytes are kept across `Poll::Pending` and across source errors.
    pub(crate) fn poll_next(&mut self, cx: &mut Context) -> Poll<Option<io::Result<Bytes>>> {
        loop {
            if self.exhausted {
                return Poll::Ready(None);
            }

            if self.pending.len() >= self.chunk_size {
                return Poll::Ready(Some(Ok(self.emit())));
            }

            match ready!(Pin::new(&mut self.source).poll_next(cx)) {
                Some(Ok(chunk)) => {
                    trace!("source chunk of {} bytes", chunk.len());
                    if !chunk.is_empty() {
                        self.pending.push(chunk, self.chunk_size);
                    }
                }
                Some(Err(err)) => {
                    debug!("source error: {err}");
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    self.exhausted = true;
                    let chunk = self.emit();
                    debug!("source exhausted, {} bytes consumed", self.consumed);
                    return Poll::Ready(if chunk.is_empty() { None } else { Some(Ok(chunk)) });
                }
            }
        }
    }
}
