//! Mesh asset transport
//!
//! [`MeshSource`] is the seam between the loader and the network: production
//! uses the blocking HTTP implementation, tests substitute in-memory or
//! failing sources.

use std::io::Read;

use crate::error::{EngineError, EngineResult};

/// Streamed-read chunk size for progress-reporting downloads
const CHUNK_BYTES: usize = 64 * 1024;

/// Upper bound on the Content-Length-driven pre-allocation. The header is
/// server-controlled, so it sizes the first allocation but never commits
/// more than this up front; larger bodies grow the buffer as bytes arrive.
const MAX_PREALLOC_BYTES: u64 = 64 * 1024 * 1024;

fn initial_capacity(content_length: u64) -> usize {
    content_length.min(MAX_PREALLOC_BYTES) as usize
}

/// Fetches raw mesh bytes for a URL, reporting download progress.
///
/// `progress` receives percent-complete values in 0..=100 for the download
/// phase only. Implementations without incremental reads may report a single
/// 100 once the body is in memory.
pub trait MeshSource: Send + Sync {
    fn fetch(&self, url: &str, progress: &mut dyn FnMut(u32)) -> EngineResult<Vec<u8>>;
}

/// HTTP GET transport with incremental reads.
///
/// Honors `Content-Length` for percentage reporting; when the length is
/// unknown the body is read in one shot and 100 is emitted immediately.
/// Any non-2xx status is fatal for the request.
pub struct HttpMeshSource {
    client: reqwest::blocking::Client,
}

impl HttpMeshSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpMeshSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshSource for HttpMeshSource {
    fn fetch(&self, url: &str, progress: &mut dyn FnMut(u32)) -> EngineResult<Vec<u8>> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| EngineError::transport(url, e))?;
        if !response.status().is_success() {
            return Err(EngineError::transport(
                url,
                format!("HTTP {}", response.status()),
            ));
        }

        match response.content_length() {
            Some(total) if total > 0 => {
                let mut bytes = Vec::with_capacity(initial_capacity(total));
                let mut chunk = [0_u8; CHUNK_BYTES];
                loop {
                    let n = response
                        .read(&mut chunk)
                        .map_err(|e| EngineError::transport(url, e))?;
                    if n == 0 {
                        break;
                    }
                    bytes.extend_from_slice(&chunk[..n]);
                    progress(((bytes.len() as u64 * 100) / total).min(100) as u32);
                }
                Ok(bytes)
            }
            _ => {
                // No usable length: read to end, report the phase complete
                let mut bytes = Vec::new();
                response
                    .read_to_end(&mut bytes)
                    .map_err(|e| EngineError::transport(url, e))?;
                progress(100);
                Ok(bytes)
            }
        }
    }
}
