//! # zipfence
//!
//! Bounded, filtered extraction of ZIP archives received from untrusted
//! sources, such as bundles uploaded to a bot or service.
//!
//! An extraction is a single pass over the archive's central directory that
//! keeps only the entries passing a path allow-list and extension filter,
//! stops after a maximum number of files, skips entries above a size ceiling,
//! and refuses entry names that would land outside the output directory.
//!
//! ## Features
//!
//! - Archives from a local file, an in-memory buffer or stream, or an HTTP
//!   URL read with Range requests
//! - ZIP64, STORED and DEFLATE
//! - Loose path matching: a filter selects an entry when either contains the other
//! - Count and size ceilings, optional failure when the size ceiling left nothing
//! - Zip-slip rejection
//! - Cooperative cancellation between entries
//! - A [`FilesystemPort`] seam with an in-memory implementation
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipfence::{ExtractionRequest, LocalFileReader, extract};
//!
//! #[tokio::main]
//! async fn main() -> zipfence::Result<()> {
//!     let source = Arc::new(LocalFileReader::new("upload.zip".as_ref())?);
//!     let request = ExtractionRequest::new("bundles/42")
//!         .path_filters(["config/"])
//!         .extension(".json")
//!         .max_entry_count(50)
//!         .max_entry_size(1 << 20);
//!
//!     if !extract(source, &request).await? {
//!         println!("nothing extracted");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
mod error;
pub mod extract;
pub mod fs;
pub mod io;
pub mod pattern;
pub mod zip;

pub use cli::Cli;
pub use error::{Error, Result};
pub use extract::{ExtractionOutcome, ExtractionRequest, extract, extract_with};
pub use fs::{FileSink, FilesystemPort, LocalFs, MemoryFs};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use zip::{ArchiveEntry, ArchiveReader};
