use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{FileSink, FilesystemPort};
use crate::error::{Error, Result};

/// The real filesystem through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FilesystemPort for LocalFs {
    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| Error::filesystem(path, e))
    }

    async fn create_file(&self, path: &Path) -> Result<Box<dyn FileSink>> {
        let file = fs::File::create(path)
            .await
            .map_err(|e| Error::filesystem(path, e))?;
        Ok(Box::new(LocalFile {
            path: path.to_path_buf(),
            file,
        }))
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }
}

struct LocalFile {
    path: PathBuf,
    file: fs::File,
}

#[async_trait]
impl FileSink for LocalFile {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| Error::filesystem(&self.path, e))
    }

    async fn finish(&mut self) -> Result<()> {
        self.file
            .flush()
            .await
            .map_err(|e| Error::filesystem(&self.path, e))
    }
}
