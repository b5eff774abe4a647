//! Source adapters.
//!
//! A source is any [`Stream`] of [`io::Result<Bytes>`] that is [`Unpin`]. It is consumed once,
//! in order, and signals end of data by returning `None`.
//!
//! - [`IoSource`] turns an [`AsyncRead`] into a source
//! - [`Limited`] ends an inner source after a byte limit
//!
//! [`Stream`]: futures_core::Stream
//! [`io::Result<Bytes>`]: std::io::Result
//! [`Bytes`]: bytes::Bytes
//! [`AsyncRead`]: tokio::io::AsyncRead
mod io;
mod limited;

pub use io::IoSource;
pub use limited::Limited;

#[cfg(test)]
mod test;
