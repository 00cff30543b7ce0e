use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::ReadAt;
use crate::error::Result;

/// Archive held entirely in memory.
///
/// Uploaded bundles usually arrive as a body or a non-seekable stream; the
/// reader buffers them so the central directory at the tail can be reached.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Drain a forward-only stream into memory.
    pub async fn from_async_read<S: AsyncRead + Unpin>(mut stream: S) -> Result<Self> {
        let mut data = Vec::new();
        stream.read_to_end(&mut data).await?;
        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MemoryReader {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let len = self.data.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
