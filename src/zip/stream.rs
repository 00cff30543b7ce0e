use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{Error, Result};
use crate::io::ReadAt;

/// Upper bound for one compressed read and for one decoded chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Decoded contents of one entry, produced a chunk at a time.
///
/// Output never runs past the length declared in the central directory. A
/// DEFLATE stream that ends short of it, or would run past it, is
/// [`Error::Malformed`].
pub struct EntryStream<'a, R: ReadAt + ?Sized> {
    source: &'a R,
    name: String,
    offset: u64,
    remaining: u64,
    declared: u64,
    produced: u64,
    inflater: Option<Decompress>,
    input: Vec<u8>,
    consumed: usize,
    finished: bool,
}

impl<'a, R: ReadAt + ?Sized> EntryStream<'a, R> {
    pub(crate) fn stored(source: &'a R, name: &str, offset: u64, length: u64) -> Self {
        Self::new(source, name, offset, length, length, None)
    }

    pub(crate) fn deflated(source: &'a R, name: &str, offset: u64, compressed: u64, length: u64) -> Self {
        Self::new(source, name, offset, compressed, length, Some(Decompress::new(false)))
    }

    fn new(
        source: &'a R,
        name: &str,
        offset: u64,
        compressed: u64,
        declared: u64,
        inflater: Option<Decompress>,
    ) -> Self {
        Self {
            source,
            name: name.to_string(),
            offset,
            remaining: compressed,
            declared,
            produced: 0,
            inflater,
            input: Vec::new(),
            consumed: 0,
            finished: false,
        }
    }

    /// Bytes decoded so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// The next decoded chunk, at most [`CHUNK_SIZE`] bytes, or `None` once
    /// the entry is complete.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }
        if self.inflater.is_none() {
            return self.next_stored().await;
        }
        self.next_inflated().await
    }

    async fn fill(&mut self) -> Result<()> {
        let len = self.remaining.min(CHUNK_SIZE as u64) as usize;
        self.input.resize(len, 0);
        self.source.read_exact_at(self.offset, &mut self.input).await?;
        self.offset += len as u64;
        self.remaining -= len as u64;
        self.consumed = 0;
        Ok(())
    }

    async fn next_stored(&mut self) -> Result<Option<Vec<u8>>> {
        if self.remaining == 0 {
            self.finished = true;
            return Ok(None);
        }
        self.fill().await?;
        self.produced += self.input.len() as u64;
        Ok(Some(std::mem::take(&mut self.input)))
    }

    async fn next_inflated(&mut self) -> Result<Option<Vec<u8>>> {
        let mut out = vec![0u8; CHUNK_SIZE];
        loop {
            if self.consumed == self.input.len() && self.remaining > 0 {
                self.fill().await?;
            }

            let Some(inflater) = self.inflater.as_mut() else {
                return Ok(None);
            };
            let (before_in, before_out) = (inflater.total_in(), inflater.total_out());
            let status = inflater
                .decompress(&self.input[self.consumed..], &mut out, FlushDecompress::None)
                .map_err(|e| Error::malformed(format!("failed to inflate '{}': {e}", self.name)))?;
            let used = (inflater.total_in() - before_in) as usize;
            let written = (inflater.total_out() - before_out) as usize;

            self.consumed += used;
            self.produced += written as u64;
            if self.produced > self.declared {
                return Err(Error::malformed(format!(
                    "'{}' inflates past the {} bytes its header declares",
                    self.name, self.declared
                )));
            }
            if status == Status::StreamEnd {
                self.finished = true;
                if self.produced != self.declared {
                    return Err(Error::malformed(format!(
                        "'{}' inflated to {} bytes, header declares {}",
                        self.name, self.produced, self.declared
                    )));
                }
            }

            if written > 0 {
                out.truncate(written);
                return Ok(Some(out));
            }
            if self.finished {
                return Ok(None);
            }
            if used == 0 {
                return Err(Error::malformed(format!(
                    "deflate stream of '{}' is truncated",
                    self.name
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    async fn drain<R: ReadAt>(mut stream: EntryStream<'_, R>) -> Result<Vec<Vec<u8>>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next_chunk().await? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    #[tokio::test]
    async fn inflate_checks_declared_length() {
        let raw = deflate(b"hello hello hello");
        let source = MemoryReader::new(raw.clone());
        let len = raw.len() as u64;

        let chunks = drain(EntryStream::deflated(&source, "a", 0, len, 17)).await.unwrap();
        assert_eq!(chunks.concat(), b"hello hello hello");

        let short = drain(EntryStream::deflated(&source, "a", 0, len, 5)).await;
        assert!(matches!(short, Err(Error::Malformed(_))));
        let long = drain(EntryStream::deflated(&source, "a", 0, len, 40)).await;
        assert!(matches!(long, Err(Error::Malformed(_))));
    }

    #[tokio::test]
    async fn large_entries_come_out_in_bounded_chunks() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 5 + 123)).map(|i| (i % 251) as u8).collect();
        let raw = deflate(&data);
        let source = MemoryReader::new(raw.clone());

        let chunks = drain(EntryStream::deflated(&source, "big", 0, raw.len() as u64, data.len() as u64))
            .await
            .unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= CHUNK_SIZE));
        assert_eq!(chunks.concat(), data);

        let stored = MemoryReader::new(data.clone());
        let chunks = drain(EntryStream::stored(&stored, "big", 0, data.len() as u64))
            .await
            .unwrap();
        assert!(chunks.iter().all(|c| c.len() <= CHUNK_SIZE));
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn huge_declared_length_stops_at_stream_end() {
        let raw = deflate(&[0u8; 4096]);
        let source = MemoryReader::new(raw.clone());
        let mut stream = EntryStream::deflated(&source, "bomb", 0, raw.len() as u64, u64::MAX / 2);

        let mut err = None;
        loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => assert!(chunk.len() <= CHUNK_SIZE),
                Ok(None) => break,
                Err(e) => {
                    err = Some(e);
                    break;
                }
            }
        }
        assert!(matches!(err, Some(Error::Malformed(_))));
        assert_eq!(stream.produced(), 4096);
    }

    #[tokio::test]
    async fn cut_off_deflate_stream_is_malformed() {
        let raw = deflate(&(0..10_000u32).flat_map(|i| i.to_le_bytes()).collect::<Vec<_>>());
        let cut = &raw[..raw.len() / 2];
        let source = MemoryReader::new(cut.to_vec());
        let result = drain(EntryStream::deflated(&source, "cut", 0, cut.len() as u64, 40_000)).await;
        assert!(matches!(result, Err(Error::Malformed(_))));
    }
}
