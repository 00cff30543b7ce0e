use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{FileSink, FilesystemPort};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Tree {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

/// In-memory filesystem.
///
/// Writes fail unless the parent directory was created first, mirroring
/// what the real filesystem would do.
#[derive(Debug, Default)]
pub struct MemoryFs {
    tree: Arc<Mutex<Tree>>,
}

fn lock(tree: &Mutex<Tree>) -> MutexGuard<'_, Tree> {
    tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        lock(&self.tree)
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    /// All file paths, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.lock().files.keys().cloned().collect()
    }

    /// All directory paths, sorted.
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.lock().dirs.iter().cloned().collect()
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }
}

#[async_trait]
impl FilesystemPort for MemoryFs {
    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut tree = self.lock();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            if tree.files.contains_key(ancestor) {
                return Err(Error::filesystem(
                    ancestor,
                    io::Error::new(io::ErrorKind::AlreadyExists, "a file occupies this path"),
                ));
            }
            tree.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    async fn create_file(&self, path: &Path) -> Result<Box<dyn FileSink>> {
        let mut tree = self.lock();
        if tree.dirs.contains(path) {
            return Err(Error::filesystem(
                path,
                io::Error::new(io::ErrorKind::IsADirectory, "a directory occupies this path"),
            ));
        }
        let parent_ok = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tree.dirs.contains(parent),
            _ => true,
        };
        if !parent_ok {
            return Err(Error::filesystem(
                path,
                io::Error::new(io::ErrorKind::NotFound, "parent directory does not exist"),
            ));
        }
        tree.files.insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryFile {
            tree: Arc::clone(&self.tree),
            path: path.to_path_buf(),
        }))
    }

    async fn exists(&self, path: &Path) -> bool {
        let tree = self.lock();
        tree.files.contains_key(path) || tree.dirs.contains(path)
    }
}

struct MemoryFile {
    tree: Arc<Mutex<Tree>>,
    path: PathBuf,
}

#[async_trait]
impl FileSink for MemoryFile {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let mut tree = lock(&self.tree);
        match tree.files.get_mut(&self.path) {
            Some(contents) => {
                contents.extend_from_slice(chunk);
                Ok(())
            }
            None => Err(Error::filesystem(
                &self.path,
                io::Error::new(io::ErrorKind::NotFound, "file was removed while open"),
            )),
        }
    }

    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracks_dirs_and_files() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/out/a/b")).await.unwrap();
        fs.write_file(Path::new("/out/a/b/f.txt"), b"hi").await.unwrap();

        assert!(fs.exists(Path::new("/out/a")).await);
        assert!(fs.exists(Path::new("/out/a/b/f.txt")).await);
        assert_eq!(fs.read("/out/a/b/f.txt").as_deref(), Some(&b"hi"[..]));
        assert_eq!(fs.files(), vec![PathBuf::from("/out/a/b/f.txt")]);
    }

    #[tokio::test]
    async fn streamed_file_replaces_previous_contents() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/out")).await.unwrap();
        fs.write_file(Path::new("/out/f"), b"old and long").await.unwrap();

        let mut file = fs.create_file(Path::new("/out/f")).await.unwrap();
        assert_eq!(fs.read("/out/f").as_deref(), Some(&b""[..]));
        file.write_chunk(b"ne").await.unwrap();
        file.write_chunk(b"w").await.unwrap();
        file.finish().await.unwrap();
        assert_eq!(fs.read("/out/f").as_deref(), Some(&b"new"[..]));
    }

    #[tokio::test]
    async fn write_requires_parent() {
        let fs = MemoryFs::new();
        let err = fs.write_file(Path::new("/out/x.txt"), b"x").await.unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
        assert_eq!(fs.file_count(), 0);
    }

    #[tokio::test]
    async fn directory_over_file_is_rejected() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/out")).await.unwrap();
        fs.write_file(Path::new("/out/x"), b"x").await.unwrap();
        assert!(fs.create_dir_all(Path::new("/out/x/y")).await.is_err());
    }
}
