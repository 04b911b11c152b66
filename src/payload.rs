//! Finite byte sources read as bounded chunks for client-stream uploads.

use std::io;
use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on the size of one upload message.
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// A finite source read one bounded chunk at a time.
#[tonic::async_trait]
pub trait ChunkSource: Send {
    /// The next chunk in read order, or `None` once the source is exhausted.
    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>>;
}

/// Reads an [`AsyncRead`] as chunks of exactly `chunk_size` bytes; only the last may be shorter.
#[derive(Debug)]
pub struct ChunkedReader<R> {
    reader: R,
    chunk_size: usize,
    exhausted: bool,
}

impl<R> ChunkedReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R, chunk_size: usize) -> io::Result<Self> {
        if chunk_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "chunk size must be greater than zero",
            ));
        }
        Ok(Self {
            reader,
            chunk_size,
            exhausted: false,
        })
    }
}

impl ChunkedReader<tokio::fs::File> {
    /// Open the file at `path` for chunked reading.
    pub async fn open(path: impl AsRef<Path>, chunk_size: usize) -> io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Self::new(file, chunk_size)
    }
}

impl ChunkedReader<Cursor<Bytes>> {
    /// Read an in-memory buffer in chunks.
    pub fn from_bytes(bytes: impl Into<Bytes>, chunk_size: usize) -> io::Result<Self> {
        Self::new(Cursor::new(bytes.into()), chunk_size)
    }
}

#[tonic::async_trait]
impl<R> ChunkSource for ChunkedReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buffer = vec![0u8; self.chunk_size];
        let mut filled = 0;

        // Short reads are normal for files and sockets; keep filling until the chunk is full.
        while filled < self.chunk_size {
            let read = self.reader.read(&mut buffer[filled..]).await?;
            if read == 0 {
                self.exhausted = true;
                break;
            }
            filled += read;
        }

        if filled == 0 {
            return Ok(None);
        }

        buffer.truncate(filled);
        Ok(Some(Bytes::from(buffer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn drain(source: &mut impl ChunkSource) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        while let Some(chunk) = source.next_chunk().await.unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn test_last_chunk_is_short() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = ChunkedReader::from_bytes(data.clone(), DEFAULT_CHUNK_SIZE).unwrap();

        let chunks = drain(&mut reader).await;

        let sizes: Vec<_> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![2048, 2048, 904]);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_trailing_chunk() {
        let mut reader = ChunkedReader::from_bytes(vec![7u8; 4096], 2048).unwrap();

        let chunks = drain(&mut reader).await;

        assert_eq!(chunks.len(), 2);
        assert!(reader.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_source_yields_nothing() {
        let mut reader = ChunkedReader::from_bytes(Bytes::new(), 2048).unwrap();
        assert!(reader.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_short_reads_are_coalesced() {
        let first = Cursor::new(vec![1u8; 100]);
        let second = Cursor::new(vec![2u8; 100]);
        let mut reader = ChunkedReader::new(first.chain(second), 150).unwrap();

        let chunks = drain(&mut reader).await;

        let sizes: Vec<_> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![150, 50]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = ChunkedReader::from_bytes(vec![1u8], 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[42u8; 3000]).unwrap();
        file.flush().unwrap();

        let mut reader = ChunkedReader::open(file.path(), 1024).await.unwrap();
        let chunks = drain(&mut reader).await;

        let sizes: Vec<_> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![1024, 1024, 952]);
    }
}
