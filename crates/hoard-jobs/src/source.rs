//! Byte streams that feed export jobs.

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Default read size for reader-backed sources.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A readable byte stream exported into the cache.
///
/// Dropping the source releases whatever it reads from (file handle, socket).
/// The transfer task drops it before reporting a job as released, which is
/// how cancellation closes the underlying resource.
pub struct ExportSource {
    inner: BoxStream<'static, io::Result<Bytes>>,
}

impl ExportSource {
    /// Wraps an arbitrary chunk stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Reads `reader` in chunks of [`DEFAULT_CHUNK_SIZE`].
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::from_reader_with_capacity(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Reads `reader` in chunks of at most `capacity` bytes.
    pub fn from_reader_with_capacity<R>(reader: R, capacity: usize) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::new(ReaderStream::with_capacity(reader, capacity))
    }

    /// Opens the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub async fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::from_reader(file))
    }

    /// Yields each of `chunks` in order.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<io::Result<Bytes>> = chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self::new(stream::iter(chunks))
    }
}

impl Stream for ExportSource {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for ExportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportSource").finish_non_exhaustive()
    }
}
