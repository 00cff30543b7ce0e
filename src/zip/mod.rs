//! ZIP container reading.
//!
//! - [`structures`]: fixed records (end of central directory, ZIP64 records) and [`ArchiveEntry`]
//! - [`reader`]: [`ArchiveReader`], which parses the central directory and opens entries
//! - [`stream`]: [`EntryStream`], chunked STORED/DEFLATE decoding bounded by the declared length
//!
//! ## Supported
//!
//! - Standard ZIP (PKZIP APPNOTE 6.3.x) and ZIP64 extensions
//! - STORED and DEFLATE entries
//!
//! ## Not supported
//!
//! - Encryption, multi-disk archives, BZIP2/LZMA/other methods

mod reader;
mod stream;
mod structures;

pub use reader::ArchiveReader;
pub use stream::{CHUNK_SIZE, EntryStream};
pub use structures::{ArchiveEntry, CompressionMethod, DirectoryLocation};

pub(crate) use structures::is_directory_marker;
