//! Binary PLY header and body parsing
//!
//! Only the subset of PLY this engine streams is interpreted: an ASCII
//! header declaring `element vertex <N>`, an `end_header` sentinel, and a
//! body of raw interleaved little-endian f32 (x, y, z) triples. Comments,
//! normals, colors, and alternate encodings are ignored.

use crate::error::{EngineError, EngineResult};

/// Headers are small; scanning is bounded to this prefix.
const MAX_HEADER_BYTES: usize = 64 * 1024;

const END_HEADER: &[u8] = b"end_header";

/// Parsed header: vertex count and the byte offset of the first float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHeader {
    pub vertex_count: usize,
    pub data_offset: usize,
}

/// Locate `end_header` and the `element vertex` declaration in the ASCII
/// prefix of `bytes`.
///
/// The header is pure ASCII, so its byte offsets and character offsets
/// coincide: `data_offset` points at the byte immediately after the
/// `end_header` line's newline.
pub fn parse_header(bytes: &[u8]) -> EngineResult<MeshHeader> {
    let prefix = &bytes[..bytes.len().min(MAX_HEADER_BYTES)];

    let sentinel = find_subslice(prefix, END_HEADER)
        .ok_or_else(|| EngineError::Parse("missing end_header".into()))?;
    let newline = prefix[sentinel..]
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| EngineError::Parse("malformed end_header line".into()))?;
    let data_offset = sentinel + newline + 1;

    // Decoded lossily: a stray non-ASCII byte in a comment must not reject
    // an otherwise well-formed header
    let header_text = String::from_utf8_lossy(&prefix[..sentinel]);

    let vertex_count = header_text
        .lines()
        .find_map(|line| {
            let mut words = line.split_whitespace();
            match (words.next(), words.next(), words.next()) {
                (Some("element"), Some("vertex"), Some(n)) => n.parse::<usize>().ok(),
                _ => None,
            }
        })
        .ok_or_else(|| EngineError::Parse("missing element vertex count".into()))?;
    if vertex_count == 0 {
        return Err(EngineError::Parse("bad vertex count".into()));
    }

    Ok(MeshHeader {
        vertex_count,
        data_offset,
    })
}

/// Reinterpret the body as `vertex_count * 3` little-endian f32 values.
///
/// If the data offset happens to be float-aligned within the buffer the
/// slice is cast in place; otherwise the bytes are copied into an aligned
/// allocation first. A body shorter than the header promises is a parse
/// error, not an out-of-bounds read.
pub fn parse_body(bytes: &[u8], header: &MeshHeader) -> EngineResult<Vec<f32>> {
    let float_count = header.vertex_count * 3;
    let byte_len = float_count * std::mem::size_of::<f32>();
    let end = header.data_offset.checked_add(byte_len).filter(|&e| e <= bytes.len());
    let Some(end) = end else {
        return Err(EngineError::Parse(format!(
            "truncated body: header promises {} vertices but only {} bytes follow",
            header.vertex_count,
            bytes.len().saturating_sub(header.data_offset)
        )));
    };

    let body = &bytes[header.data_offset..end];
    let floats = match bytemuck::try_cast_slice::<u8, f32>(body) {
        Ok(aligned) => aligned.to_vec(),
        Err(_) => body
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    };
    Ok(floats)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn synthetic_ply(vertices: &[f32]) -> Vec<u8> {
        let mut bytes = format!(
            "ply\nformat binary_little_endian 1.0\nelement vertex {}\n\
             property float x\nproperty float y\nproperty float z\nend_header\n",
            vertices.len() / 3
        )
        .into_bytes();
        for v in vertices {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn round_trip_header_and_first_vertex() {
        let vertices: Vec<f32> = (0..3_000).map(|i| i as f32 * 0.25).collect();
        let bytes = synthetic_ply(&vertices);

        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.vertex_count, 1_000);
        // data_offset points exactly at the first float's first byte
        assert_eq!(
            &bytes[header.data_offset..header.data_offset + 4],
            &vertices[0].to_le_bytes()
        );

        let floats = parse_body(&bytes, &header).unwrap();
        assert_eq!(floats, vertices);
    }

    #[test]
    fn missing_end_header_fails() {
        let bytes = b"ply\nformat binary_little_endian 1.0\nelement vertex 10\n".to_vec();
        assert!(matches!(parse_header(&bytes), Err(EngineError::Parse(_))));
    }

    #[test]
    fn missing_vertex_count_fails() {
        let bytes = b"ply\nformat binary_little_endian 1.0\nend_header\n".to_vec();
        assert!(matches!(parse_header(&bytes), Err(EngineError::Parse(_))));
    }

    #[test]
    fn zero_vertex_count_fails() {
        let bytes = b"ply\nelement vertex 0\nend_header\n".to_vec();
        assert!(matches!(parse_header(&bytes), Err(EngineError::Parse(_))));
    }

    #[test]
    fn end_header_without_newline_fails() {
        let bytes = b"ply\nelement vertex 1\nend_header".to_vec();
        assert!(matches!(parse_header(&bytes), Err(EngineError::Parse(_))));
    }

    #[test]
    fn non_utf8_comment_byte_does_not_reject_the_header() {
        let vertices = [1.0_f32, 2.0, 3.0];
        let mut bytes = b"ply\ncomment caf\xE9\nelement vertex 1\nend_header\n".to_vec();
        for v in vertices {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.vertex_count, 1);
        assert_eq!(parse_body(&bytes, &header).unwrap(), vertices.to_vec());
    }

    #[test]
    fn truncated_body_fails() {
        let mut bytes = synthetic_ply(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        bytes.truncate(bytes.len() - 5);
        let header = parse_header(&bytes).unwrap();
        assert!(matches!(parse_body(&bytes, &header), Err(EngineError::Parse(_))));
    }

    #[test]
    fn unaligned_data_offset_still_parses() {
        // Pad the header with a comment so data_offset lands off a 4-byte
        // boundary regardless of allocator alignment.
        let vertices = [9.5_f32, -2.0, 0.125];
        let mut bytes = b"ply\ncomment x\nelement vertex 1\nend_header\n".to_vec();
        assert_ne!(bytes.len() % 4, 0);
        for v in vertices {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let header = parse_header(&bytes).unwrap();
        assert_eq!(parse_body(&bytes, &header).unwrap(), vertices.to_vec());
    }
}
