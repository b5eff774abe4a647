//! Reader configuration.
use crate::BufferedReader;

/// Default minimum chunk size for [`BufferedReader`] (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Default number of chunks a size bounded read pre-allocates for.
pub const DEFAULT_MAX_JOIN_CHUNKS: usize = 1024;

/// [`BufferedReader`] configuration.
///
/// ```
/// use body_reader::Config;
///
/// let config = Config::new().chunk_size(1024);
/// assert_eq!(config.get_chunk_size(), 1024);
/// assert_eq!(config.max_join_size(), 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    chunk_size: usize,
    max_join_chunks: usize,
}

impl Config {
    /// Create default configuration.
    pub const fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_join_chunks: DEFAULT_MAX_JOIN_CHUNKS,
        }
    }

    /// Set the minimum size of chunks pulled from the source.
    ///
    /// Zero resets to [`DEFAULT_CHUNK_SIZE`].
    pub const fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    /// Set how many chunks a size bounded read may reserve up front.
    ///
    /// Reads larger than `chunk_size * max_join_chunks` grow the buffer as chunks arrive.
    pub const fn max_join_chunks(mut self, max_join_chunks: usize) -> Self {
        self.max_join_chunks = if max_join_chunks == 0 { 1 } else { max_join_chunks };
        self
    }

    pub const fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub const fn get_max_join_chunks(&self) -> usize {
        self.max_join_chunks
    }

    /// Returns `chunk_size * max_join_chunks`, saturating.
    pub const fn max_join_size(&self) -> usize {
        self.chunk_size.saturating_mul(self.max_join_chunks)
    }

    /// Create a [`BufferedReader`] over `source` with this configuration.
    pub fn build<S>(self, source: S) -> BufferedReader<S> {
        BufferedReader::with_config(source, self)
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
