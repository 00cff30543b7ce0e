//! Filesystem capabilities used by the extraction engine.
//!
//! The engine only needs a few operations, captured by [`FilesystemPort`].
//! Entry data arrives in chunks and goes out through a [`FileSink`].
//! [`LocalFs`] maps them onto `tokio::fs`; [`MemoryFs`] keeps everything in
//! memory for dry runs and tests. [`storage`] holds the general-purpose
//! helpers hosts use around an extraction.

mod local;
mod memory;
pub mod storage;

pub use local::LocalFs;
pub use memory::MemoryFs;

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// An open file receiving an entry's data.
#[async_trait]
pub trait FileSink: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;

    /// Flush anything buffered. The file is complete once this returns.
    async fn finish(&mut self) -> Result<()>;
}

#[async_trait]
pub trait FilesystemPort: Send + Sync {
    /// Create `path` and any missing parents. Existing directories are fine.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Create `path`, truncating any existing file, and open it for writing.
    async fn create_file(&self, path: &Path) -> Result<Box<dyn FileSink>>;

    /// Write `contents` to `path`, replacing any existing file.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut file = self.create_file(path).await?;
        file.write_chunk(contents).await?;
        file.finish().await
    }

    async fn exists(&self, path: &Path) -> bool;
}
