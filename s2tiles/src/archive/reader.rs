//! Byte-range sources for archives.

use std::future::Future;
use std::io::{self, SeekFrom};
use std::path::Path;

use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

/// Random access to archive bytes.
///
/// A read past the end returns the bytes that exist, so callers can ask for
/// a generous prefix without knowing the archive size.
pub trait RangeReader: Send + Sync + 'static {
    fn read_range(&self, offset: u64, length: u64) -> impl Future<Output = io::Result<Bytes>> + Send;
}

/// An archive held in memory.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Bytes,
}

impl MemoryReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl RangeReader for MemoryReader {
    async fn read_range(&self, offset: u64, length: u64) -> io::Result<Bytes> {
        let len = self.data.len() as u64;
        let start = offset.min(len);
        let end = offset.saturating_add(length).min(len);
        Ok(self.data.slice(start as usize..end as usize))
    }
}

/// An archive read from a local file.
#[derive(Debug)]
pub struct FileReader {
    file: Mutex<File>,
    len: u64,
}

impl FileReader {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path).await?;
        let len = file.metadata().await?.len();
        Ok(Self {
            file: Mutex::new(file),
            len,
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl RangeReader for FileReader {
    async fn read_range(&self, offset: u64, length: u64) -> io::Result<Bytes> {
        let available = self.len.saturating_sub(offset).min(length);
        let mut buf = BytesMut::zeroed(available as usize);
        if available > 0 {
            let mut file = self.file.lock().await;
            file.seek(SeekFrom::Start(offset)).await?;
            file.read_exact(&mut buf).await?;
        }
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_memory_reader_ranges() {
        let reader = MemoryReader::new(Bytes::from_static(b"0123456789"));
        assert_eq!(&reader.read_range(2, 3).await.unwrap()[..], b"234");
        assert_eq!(&reader.read_range(8, 100).await.unwrap()[..], b"89");
        assert!(reader.read_range(20, 5).await.unwrap().is_empty());
        assert_eq!(reader.len(), 10);
    }

    #[tokio::test]
    async fn test_file_reader_ranges() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abcdefghij").unwrap();
        file.flush().unwrap();

        let reader = FileReader::open(file.path()).await.unwrap();
        assert_eq!(reader.len(), 10);
        assert_eq!(&reader.read_range(0, 4).await.unwrap()[..], b"abcd");
        assert_eq!(&reader.read_range(7, 50).await.unwrap()[..], b"hij");
        assert!(reader.read_range(10, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_reader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileReader::open(dir.path().join("absent.pmtiles")).await.is_err());
    }
}
