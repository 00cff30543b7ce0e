//! Thin filesystem helpers used around an extraction: preparing and cleaning
//! output roots, enumerating results, and persisting raw uploads.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::pattern::wildcard_match;

/// Create `path` and its parents. Succeeds if it already exists.
pub async fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| Error::filesystem(path, e))
}

/// Remove `path` and everything below it.
pub async fn delete_dir(path: &Path) -> Result<()> {
    fs::remove_dir_all(path)
        .await
        .map_err(|e| Error::filesystem(path, e))
}

pub async fn delete_file(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .await
        .map_err(|e| Error::filesystem(path, e))
}

pub async fn dir_exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

/// Files under `dir`, sorted. `pattern` (with `*`/`?`) is matched against
/// the file name only.
pub async fn list_files(dir: &Path, pattern: Option<&str>, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut read_dir = fs::read_dir(&current)
            .await
            .map_err(|e| Error::filesystem(&current, e))?;
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Error::filesystem(&current, e))?
        {
            let path = entry.path();
            if file_type(&entry).await?.is_dir() {
                if recursive {
                    pending.push(path);
                }
                continue;
            }

            let name = entry.file_name();
            if pattern.is_none_or(|p| wildcard_match(p, &name.to_string_lossy())) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Immediate subdirectories of `dir`, sorted.
pub async fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut read_dir = fs::read_dir(dir)
        .await
        .map_err(|e| Error::filesystem(dir, e))?;
    let mut dirs = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| Error::filesystem(dir, e))?
    {
        if file_type(&entry).await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

async fn file_type(entry: &fs::DirEntry) -> Result<std::fs::FileType> {
    entry
        .file_type()
        .await
        .map_err(|e| Error::filesystem(entry.path(), e))
}

/// Copy `stream` into a new file at `dest`, creating parent directories.
///
/// Returns the number of bytes written.
pub async fn save_stream<S: AsyncRead + Unpin>(mut stream: S, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir(parent).await?;
    }

    let mut file = fs::File::create(dest)
        .await
        .map_err(|e| Error::filesystem(dest, e))?;
    let written = tokio::io::copy(&mut stream, &mut file)
        .await
        .map_err(|e| Error::filesystem(dest, e))?;
    file.flush().await.map_err(|e| Error::filesystem(dest, e))?;

    Ok(written)
}

/// Move `src` to `dest`.
///
/// Does nothing and returns `false` when `dest` already exists; otherwise
/// creates the destination's parents, renames, and returns `true`.
pub async fn move_file(src: &Path, dest: &Path) -> Result<bool> {
    if fs::try_exists(dest).await.unwrap_or(false) {
        return Ok(false);
    }
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir(parent).await?;
    }
    fs::rename(src, dest)
        .await
        .map_err(|e| Error::filesystem(src, e))?;
    Ok(true)
}
