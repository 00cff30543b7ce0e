use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};

/// Compression methods the reader can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Stored,
            8 => Self::Deflate,
            other => Self::Unknown(other),
        }
    }
}

pub(crate) const EOCD_SIGNATURE: u32 = 0x0605_4b50;
pub(crate) const EOCD_SIZE: usize = 22;
pub(crate) const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;
pub(crate) const ZIP64_LOCATOR_SIZE: usize = 20;
pub(crate) const ZIP64_EOCD_SIGNATURE: u32 = 0x0606_4b50;
pub(crate) const ZIP64_EOCD_SIZE: usize = 56;
pub(crate) const CDFH_SIGNATURE: u32 = 0x0201_4b50;
pub(crate) const CDFH_SIZE: usize = 46;
pub(crate) const LFH_SIGNATURE: u32 = 0x0403_4b50;
pub(crate) const LFH_SIZE: usize = 30;
pub(crate) const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Where the central directory sits and how many records it holds.
///
/// Built from either the classic end record or its ZIP64 counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryLocation {
    pub entries: u64,
    pub size: u64,
    pub offset: u64,
    /// Set when any classic field is saturated, so a ZIP64 record may follow the locator.
    pub needs_zip64: bool,
}

impl DirectoryLocation {
    pub fn from_eocd(data: &[u8]) -> Result<Self> {
        if data.len() < EOCD_SIZE {
            return Err(Error::malformed("end of central directory too short"));
        }
        let mut c = Cursor::new(data);
        if c.read_u32::<LittleEndian>()? != EOCD_SIGNATURE {
            return Err(Error::malformed("bad end of central directory signature"));
        }
        let disk = c.read_u16::<LittleEndian>()?;
        let cd_disk = c.read_u16::<LittleEndian>()?;
        let disk_entries = c.read_u16::<LittleEndian>()?;
        let entries = c.read_u16::<LittleEndian>()?;
        let size = c.read_u32::<LittleEndian>()?;
        let offset = c.read_u32::<LittleEndian>()?;

        let needs_zip64 = disk_entries == u16::MAX
            || entries == u16::MAX
            || size == u32::MAX
            || offset == u32::MAX;
        if !needs_zip64 && (disk != 0 || cd_disk != 0) {
            return Err(Error::malformed("multi-disk archives are not supported"));
        }

        Ok(Self {
            entries: entries as u64,
            size: size as u64,
            offset: offset as u64,
            needs_zip64,
        })
    }

    /// Offset of the ZIP64 end record named by the locator that precedes the classic one.
    pub fn zip64_record_offset(locator: &[u8]) -> Result<u64> {
        if locator.len() < ZIP64_LOCATOR_SIZE {
            return Err(Error::malformed("ZIP64 locator too short"));
        }
        let mut c = Cursor::new(locator);
        if c.read_u32::<LittleEndian>()? != ZIP64_LOCATOR_SIGNATURE {
            return Err(Error::malformed("bad ZIP64 locator signature"));
        }
        let _disk = c.read_u32::<LittleEndian>()?;
        Ok(c.read_u64::<LittleEndian>()?)
    }

    pub fn from_zip64_eocd(data: &[u8]) -> Result<Self> {
        if data.len() < ZIP64_EOCD_SIZE {
            return Err(Error::malformed("ZIP64 end record too short"));
        }
        let mut c = Cursor::new(data);
        if c.read_u32::<LittleEndian>()? != ZIP64_EOCD_SIGNATURE {
            return Err(Error::malformed("bad ZIP64 end record signature"));
        }
        // record size, versions, disk numbers, entries on this disk
        c.set_position(32);
        let entries = c.read_u64::<LittleEndian>()?;
        let size = c.read_u64::<LittleEndian>()?;
        let offset = c.read_u64::<LittleEndian>()?;
        Ok(Self {
            entries,
            size,
            offset,
            needs_zip64: false,
        })
    }
}

/// One record of the central directory.
///
/// `name` is the raw archive path; `length` is the declared uncompressed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub length: u64,
    pub compressed_size: u64,
    pub compression_method: CompressionMethod,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
}

impl ArchiveEntry {
    /// True when the name has no final file segment.
    pub fn is_directory_marker(&self) -> bool {
        is_directory_marker(&self.name)
    }

    /// DOS date as (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let d = self.last_mod_date;
        (((d >> 9) & 0x7F) + 1980, ((d >> 5) & 0x0F) as u8, (d & 0x1F) as u8)
    }

    /// DOS time as (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let t = self.last_mod_time;
        (((t >> 11) & 0x1F) as u8, ((t >> 5) & 0x3F) as u8, ((t & 0x1F) * 2) as u8)
    }
}

/// A name is a directory marker when its last segment is empty, `.` or `..`.
pub(crate) fn is_directory_marker(name: &str) -> bool {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    matches!(last, "" | "." | "..")
}
