#![allow(dead_code)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::sync::Arc;

use zipfence::MemoryReader;

enum Method {
    Stored,
    Deflate,
    /// Raw method code with the data stored as-is.
    Other(u16),
}

struct Pending {
    name: String,
    data: Vec<u8>,
    method: Method,
    /// Uncompressed length written to the headers instead of the real one.
    claimed_length: Option<u32>,
}

/// Builds small ZIP archives in memory.
#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Pending>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(Pending {
            name: name.to_string(),
            data: data.to_vec(),
            method: Method::Stored,
            claimed_length: None,
        });
        self
    }

    pub fn deflated(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(Pending {
            name: name.to_string(),
            data: data.to_vec(),
            method: Method::Deflate,
            claimed_length: None,
        });
        self
    }

    /// A DEFLATE entry whose headers declare `claimed` uncompressed bytes.
    pub fn deflated_claiming(mut self, name: &str, data: &[u8], claimed: u32) -> Self {
        self.entries.push(Pending {
            name: name.to_string(),
            data: data.to_vec(),
            method: Method::Deflate,
            claimed_length: Some(claimed),
        });
        self
    }

    pub fn with_method(mut self, name: &str, data: &[u8], method: u16) -> Self {
        self.entries.push(Pending {
            name: name.to_string(),
            data: data.to_vec(),
            method: Method::Other(method),
            claimed_length: None,
        });
        self
    }

    pub fn dir(self, name: &str) -> Self {
        self.file(name, b"")
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let mut crc = flate2::Crc::new();
            crc.update(&entry.data);
            let crc = crc.sum();

            let (code, payload) = match entry.method {
                Method::Stored => (0u16, entry.data.clone()),
                Method::Deflate => {
                    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                    encoder.write_all(&entry.data).unwrap();
                    (8, encoder.finish().unwrap())
                }
                Method::Other(code) => (code, entry.data.clone()),
            };

            let offset = out.len() as u32;
            let name = entry.name.as_bytes();
            let length = entry.claimed_length.unwrap_or(entry.data.len() as u32);

            out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes()); // version needed
            out.extend_from_slice(&0u16.to_le_bytes()); // flags
            out.extend_from_slice(&code.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // time
            out.extend_from_slice(&0x5821u16.to_le_bytes()); // date
            out.extend_from_slice(&crc.to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&length.to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // extra
            out.extend_from_slice(name);
            out.extend_from_slice(&payload);

            central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes()); // made by
            central.extend_from_slice(&20u16.to_le_bytes()); // needed
            central.extend_from_slice(&0u16.to_le_bytes()); // flags
            central.extend_from_slice(&code.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0x5821u16.to_le_bytes());
            central.extend_from_slice(&crc.to_le_bytes());
            central.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            central.extend_from_slice(&length.to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // extra
            central.extend_from_slice(&0u16.to_le_bytes()); // comment
            central.extend_from_slice(&0u16.to_le_bytes()); // disk
            central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
            central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name);
        }

        let cd_offset = out.len() as u32;
        let count = self.entries.len() as u16;
        out.extend_from_slice(&central);

        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);
        out
    }

    pub fn reader(self) -> Arc<MemoryReader> {
        Arc::new(MemoryReader::new(self.build()))
    }
}
