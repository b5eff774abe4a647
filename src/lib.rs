//! Buffered Asynchronous Body Reader
//!
//! [`BufferedReader`] sits between a raw byte source, usually a request body arriving from the
//! network in small chunks, and consumers that want whole-body reads, size bounded reads, or
//! delimiter bounded reads such as multipart boundaries.
//!
//! ## Core
//!
//! - [`BufferedReader`] the reader itself
//! - [`Config`] reader configuration
//! - [`Destination`] sink used by [`BufferedReader::pipe`]
//!
//! ## Source
//!
//! Any [`Stream`] of [`io::Result<Bytes>`] can be read. Adapters:
//!
//! - [`IoSource`] reads chunks from an [`AsyncRead`]
//! - [`Limited`] stops an inner source after a byte limit
//!
//! [`Stream`]: futures_core::Stream
//! [`io::Result<Bytes>`]: std::io::Result
//! [`AsyncRead`]: tokio::io::AsyncRead
#![warn(missing_debug_implementations)]

mod log;
mod destination;

pub mod config;
pub mod error;
pub mod reader;
pub mod source;

pub use bytes::Bytes;

pub use config::{Config, DEFAULT_CHUNK_SIZE};
pub use destination::Destination;
pub use error::ReadError;
pub use reader::{BufferedReader, Chunks, Delimited};
pub use source::{IoSource, Limited};
