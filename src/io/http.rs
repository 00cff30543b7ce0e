use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use crate::error::{Error, Result};

const MAX_RETRY: u32 = 10;

/// Remote archive read through HTTP Range requests.
///
/// Only the tail (central directory) and the bytes of entries that pass the
/// filters are fetched.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Probe `url` with a HEAD request for range support and length.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Remote(format!("HEAD {url} returned {}", resp.status())));
        }

        let accepts_bytes = resp
            .headers()
            .get(header::ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));
        if !accepts_bytes {
            return Err(Error::Remote(format!("{url} does not support Range requests")));
        }

        let size = resp
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::Remote(format!("{url} did not report Content-Length")))?;

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Bytes pulled over the network so far
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let expected = (end - offset + 1) as usize;

        let mut received = 0;
        let mut retries = 0;

        while received < expected {
            let range = format!("bytes={}-{}", offset + received as u64, end);

            match self.client.get(&self.url).header(header::RANGE, &range).send().await {
                Ok(resp) => {
                    if resp.status() != StatusCode::PARTIAL_CONTENT {
                        return Err(Error::Remote(format!(
                            "range {range} returned {}",
                            resp.status()
                        )));
                    }

                    let bytes = resp.bytes().await?;
                    if bytes.is_empty() {
                        return Err(Error::Remote(format!("range {range} returned no data")));
                    }
                    let chunk = bytes.len().min(expected - received);
                    buf[received..received + chunk].copy_from_slice(&bytes[..chunk]);
                    received += chunk;

                    self.transferred_bytes.fetch_add(chunk as u64, Ordering::Relaxed);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retries += 1;
                    if retries >= MAX_RETRY {
                        return Err(e.into());
                    }
                    tracing::warn!(retry = retries, max = MAX_RETRY, error = %e, "range request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500 * retries as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
