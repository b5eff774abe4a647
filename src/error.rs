//! Reader errors.
use std::io;

/// Error returned from [`BufferedReader`] operations.
///
/// Errors from the source or a destination are carried unchanged in [`ReadError::Io`].
///
/// [`BufferedReader`]: crate::BufferedReader
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// Delimiter length is outside `[1, chunk_size]`.
    #[error("delimiter length must be within [1, {chunk_size}], got {len}")]
    InvalidArgument { len: usize, chunk_size: usize },
    /// The reader is already being iterated over.
    #[error("stream is already being iterated over")]
    OperationNotAllowed,
    /// Bytes at the current position are not the expected delimiter.
    #[error("expected delimiter missing")]
    DelimiterMissing,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ReadError {
    /// Returns `true` if the error came from the underlying source or destination.
    pub fn is_io(&self) -> bool {
        matches!(self, ReadError::Io(_))
    }
}

impl From<ReadError> for io::Error {
    fn from(v: ReadError) -> Self {
        match v {
            ReadError::Io(err) => err,
            ReadError::InvalidArgument { .. } => io::Error::new(io::ErrorKind::InvalidInput, v),
            ReadError::OperationNotAllowed => io::Error::other(v),
            ReadError::DelimiterMissing => io::Error::new(io::ErrorKind::InvalidData, v),
        }
    }
}
