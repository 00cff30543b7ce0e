use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a valid ZIP archive: {0}")]
    Malformed(String),

    #[error("unsupported compression method {method} for entry '{entry}'")]
    UnsupportedCompression { entry: String, method: u16 },

    #[error("entry '{entry}' resolves outside the output root: '{resolved}'")]
    PathTraversal { entry: String, resolved: PathBuf },

    #[error("{skipped} entries exceeded the size ceiling of {limit} bytes and nothing was extracted")]
    SizeCeilingExceeded { limit: u64, skipped: usize },

    #[error("extraction cancelled after {extracted} entries")]
    Cancelled { extracted: usize },

    #[error("filesystem operation failed on '{path}': {source}")]
    Filesystem { path: PathBuf, source: io::Error },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote source: {0}")]
    Remote(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Maps a short read while decoding container structures to [`Error::Malformed`].
    pub(crate) fn truncated(self, what: &str) -> Self {
        match self {
            Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Self::Malformed(format!("truncated {what}"))
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
