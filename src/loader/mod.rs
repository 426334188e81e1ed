//! Streaming binary mesh loading
//!
//! Fetches a binary PLY asset with incremental download progress, parses the
//! ASCII header for the vertex count and data offset, and hands raw float
//! buffers to the sampler.

mod http;
mod ply;

pub use http::{HttpMeshSource, MeshSource};
pub use ply::{parse_body, parse_header, MeshHeader};

use std::sync::Arc;

use crate::error::EngineResult;

/// Facade over a [`MeshSource`] plus PLY parsing.
pub struct StreamingMeshLoader {
    source: Arc<dyn MeshSource>,
}

impl StreamingMeshLoader {
    pub fn new(source: Arc<dyn MeshSource>) -> Self {
        Self { source }
    }

    /// Fetch the raw asset bytes, forwarding download progress (0..=100).
    pub fn fetch_bytes(&self, url: &str, progress: &mut dyn FnMut(u32)) -> EngineResult<Vec<u8>> {
        self.source.fetch(url, progress)
    }

    /// Parse a fetched buffer into its vertex positions.
    pub fn parse_vertices(&self, bytes: &[u8]) -> EngineResult<Vec<f32>> {
        let header = parse_header(bytes)?;
        parse_body(bytes, &header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    struct InMemorySource(Vec<u8>);

    impl MeshSource for InMemorySource {
        fn fetch(&self, _url: &str, progress: &mut dyn FnMut(u32)) -> EngineResult<Vec<u8>> {
            progress(100);
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl MeshSource for FailingSource {
        fn fetch(&self, url: &str, _progress: &mut dyn FnMut(u32)) -> EngineResult<Vec<u8>> {
            Err(EngineError::transport(url, "HTTP 404 Not Found"))
        }
    }

    fn synthetic_ply(vertices: &[f32]) -> Vec<u8> {
        let mut bytes = format!(
            "ply\nformat binary_little_endian 1.0\nelement vertex {}\nend_header\n",
            vertices.len() / 3
        )
        .into_bytes();
        for v in vertices {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn loads_vertices_through_the_source_seam() {
        let vertices = vec![1.0_f32, 2.0, 3.0, -4.0, -5.0, -6.0];
        let loader = StreamingMeshLoader::new(Arc::new(InMemorySource(synthetic_ply(&vertices))));

        let mut seen = Vec::new();
        let bytes = loader.fetch_bytes("mem://cloud.ply", &mut |p| seen.push(p)).unwrap();
        assert_eq!(seen, vec![100]);
        assert_eq!(loader.parse_vertices(&bytes).unwrap(), vertices);
    }

    #[test]
    fn transport_failure_propagates() {
        let loader = StreamingMeshLoader::new(Arc::new(FailingSource));
        let result = loader.fetch_bytes("http://example/missing.ply", &mut |_| {});
        assert!(matches!(result, Err(EngineError::Transport { .. })));
    }
}
