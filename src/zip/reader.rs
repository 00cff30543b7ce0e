//! Central-directory driven ZIP reader.
//!
//! The archive is read from the end:
//! 1. Find the End of Central Directory (EOCD) at the tail
//! 2. If any field is saturated, follow the ZIP64 locator to the ZIP64 end record
//! 3. Read the whole Central Directory in one request
//! 4. For each entry to materialize, read its Local File Header, then stream
//!    its data in bounded chunks
//!
//! Only the tail and the selected entries are touched, which keeps remote
//! sources cheap.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::stream::EntryStream;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format.
const MAX_COMMENT_SIZE: u64 = u16::MAX as u64;

/// An opened archive: the parsed central directory plus its source.
pub struct ArchiveReader<R: ReadAt> {
    source: Arc<R>,
    entries: Vec<ArchiveEntry>,
}

impl<R: ReadAt> ArchiveReader<R> {
    /// Parse the central directory of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] when no end record can be found or the
    /// directory is truncated or inconsistent.
    pub async fn open(source: Arc<R>) -> Result<Self> {
        let (location, eocd_offset) = find_end_record(source.as_ref()).await?;
        let location = if location.needs_zip64 {
            read_zip64_location(source.as_ref(), eocd_offset)
                .await?
                .unwrap_or(location)
        } else {
            location
        };

        if location.offset.saturating_add(location.size) > source.size() {
            return Err(Error::malformed("central directory extends past end of archive"));
        }

        let mut directory = vec![0u8; location.size as usize];
        source.read_exact_at(location.offset, &mut directory).await?;

        // Each record is at least CDFH_SIZE bytes; never trust the declared count for allocation.
        let capacity = location.entries.min(location.size / CDFH_SIZE as u64) as usize;
        let mut entries = Vec::with_capacity(capacity);
        let mut cursor = Cursor::new(directory.as_slice());
        for _ in 0..location.entries {
            let entry = parse_directory_record(&mut cursor).map_err(|e| e.truncated("central directory"))?;
            entries.push(entry);
        }

        Ok(Self { source, entries })
    }

    /// Entries in central-directory order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Open `entry` for chunked decoding.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedCompression`] for methods other than STORED and
    /// DEFLATE, [`Error::Malformed`] when the local header or data bounds are
    /// inconsistent.
    pub async fn open_entry(&self, entry: &ArchiveEntry) -> Result<EntryStream<'_, R>> {
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(Error::UnsupportedCompression {
                entry: entry.name.clone(),
                method,
            });
        }

        let data_offset = self.data_offset(entry).await?;
        if data_offset.saturating_add(entry.compressed_size) > self.source.size() {
            return Err(Error::malformed(format!("data of '{}' extends past end of archive", entry.name)));
        }

        let source = self.source.as_ref();
        if entry.compression_method == CompressionMethod::Deflate {
            return Ok(EntryStream::deflated(
                source,
                &entry.name,
                data_offset,
                entry.compressed_size,
                entry.length,
            ));
        }
        if entry.compressed_size != entry.length {
            return Err(Error::malformed(format!(
                "stored entry '{}' has mismatched sizes",
                entry.name
            )));
        }
        Ok(EntryStream::stored(source, &entry.name, data_offset, entry.length))
    }

    /// Decode the full contents of `entry` into memory.
    pub async fn read_entry(&self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let mut stream = self.open_entry(entry).await?;
        let mut out = Vec::new();
        while let Some(chunk) = stream.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Offset of an entry's data, past its local header and variable fields.
    async fn data_offset(&self, entry: &ArchiveEntry) -> Result<u64> {
        let mut header = [0u8; LFH_SIZE];
        self.source.read_exact_at(entry.lfh_offset, &mut header).await?;

        let mut cursor = Cursor::new(&header[..]);
        if cursor.read_u32::<LittleEndian>()? != LFH_SIGNATURE {
            return Err(Error::malformed(format!("bad local header for '{}'", entry.name)));
        }
        cursor.set_position(26);
        let name_len = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_len = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + name_len + extra_len)
    }
}

/// Locate the classic end record, first assuming no archive comment.
async fn find_end_record<R: ReadAt + ?Sized>(source: &R) -> Result<(DirectoryLocation, u64)> {
    let size = source.size();
    if size < EOCD_SIZE as u64 {
        return Err(Error::malformed("too small to hold an end of central directory"));
    }

    let offset = size - EOCD_SIZE as u64;
    let mut tail = [0u8; EOCD_SIZE];
    source.read_exact_at(offset, &mut tail).await?;
    if tail[..4] == EOCD_SIGNATURE.to_le_bytes() && tail[20..22] == [0u8, 0u8] {
        return Ok((DirectoryLocation::from_eocd(&tail)?, offset));
    }

    // A comment pushes the record back by up to MAX_COMMENT_SIZE bytes.
    let window = (MAX_COMMENT_SIZE + EOCD_SIZE as u64).min(size);
    let start = size - window;
    let mut buf = vec![0u8; window as usize];
    source.read_exact_at(start, &mut buf).await?;

    let signature = EOCD_SIGNATURE.to_le_bytes();
    for i in (0..=buf.len() - EOCD_SIZE).rev() {
        if buf[i..i + 4] != signature {
            continue;
        }
        let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
        if comment_len == buf.len() - i - EOCD_SIZE {
            let location = DirectoryLocation::from_eocd(&buf[i..i + EOCD_SIZE])?;
            return Ok((location, start + i as u64));
        }
    }

    Err(Error::malformed("end of central directory not found"))
}

/// Follow the ZIP64 locator in front of the end record.
///
/// A saturated classic field is also a legal count (exactly 65535 entries),
/// so a missing locator means the classic record stands.
async fn read_zip64_location<R: ReadAt + ?Sized>(
    source: &R,
    eocd_offset: u64,
) -> Result<Option<DirectoryLocation>> {
    let Some(locator_offset) = eocd_offset.checked_sub(ZIP64_LOCATOR_SIZE as u64) else {
        return Ok(None);
    };
    let mut locator = [0u8; ZIP64_LOCATOR_SIZE];
    source.read_exact_at(locator_offset, &mut locator).await?;
    if locator[..4] != ZIP64_LOCATOR_SIGNATURE.to_le_bytes() {
        debug!("no ZIP64 locator, keeping the classic end record");
        return Ok(None);
    }

    let record_offset = DirectoryLocation::zip64_record_offset(&locator)?;
    let mut record = [0u8; ZIP64_EOCD_SIZE];
    source.read_exact_at(record_offset, &mut record).await?;

    DirectoryLocation::from_zip64_eocd(&record).map(Some)
}

fn parse_directory_record(cursor: &mut Cursor<&[u8]>) -> Result<ArchiveEntry> {
    if cursor.read_u32::<LittleEndian>()? != CDFH_SIGNATURE {
        return Err(Error::malformed("bad central directory record signature"));
    }

    // version made by, version needed, flags
    cursor.set_position(cursor.position() + 6);
    let method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut length = cursor.read_u32::<LittleEndian>()? as u64;
    let name_len = cursor.read_u16::<LittleEndian>()? as usize;
    let extra_len = cursor.read_u16::<LittleEndian>()? as u64;
    let comment_len = cursor.read_u16::<LittleEndian>()? as u64;
    // disk start, internal and external attributes
    cursor.set_position(cursor.position() + 8);
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut name = vec![0u8; name_len];
    cursor.read_exact(&mut name)?;
    let name = String::from_utf8_lossy(&name).into_owned();

    let extra_end = cursor.position() + extra_len;
    while cursor.position() + 4 <= extra_end {
        let id = cursor.read_u16::<LittleEndian>()?;
        let field_len = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = cursor.position() + field_len;

        if id == ZIP64_EXTRA_ID {
            // Present only for the classic fields that are saturated, in this order.
            if length == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                length = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }

    let record_end = extra_end + comment_len;
    if record_end > cursor.get_ref().len() as u64 {
        return Err(Error::malformed(format!("central directory record for '{name}' is truncated")));
    }
    cursor.set_position(record_end);

    Ok(ArchiveEntry {
        name,
        length,
        compressed_size,
        compression_method: CompressionMethod::from(method),
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
    })
}
