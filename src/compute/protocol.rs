//! Compute channel message types
//!
//! Requests and responses are correlated by a per-channel ID assigned by the
//! submitter. Exactly one terminal response (Result or Error) is produced per
//! ID; zero or more Progress responses may precede it.

use crate::error::EngineError;
use crate::sampler::PointSet;

/// Caller-assigned integer identifying one request/response exchange.
/// Monotonically increasing per channel instance; never reused within the
/// channel's lifetime.
pub type RequestId = u64;

/// A sampling task dispatched to the compute context.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleRequest {
    /// Generate a seeded uniform sphere surface
    GenerateSphere {
        point_count: usize,
        radius: f32,
        seed: u32,
    },
    /// Fetch a binary PLY asset and sample it to a target sphere radius
    LoadAndSampleMesh {
        url: String,
        point_count: usize,
        target_radius: f32,
    },
}

impl SampleRequest {
    /// Number of points the terminal Result buffer will carry
    pub fn point_count(&self) -> usize {
        match self {
            Self::GenerateSphere { point_count, .. }
            | Self::LoadAndSampleMesh { point_count, .. } => *point_count,
        }
    }
}

/// A message flowing back from the compute context.
#[derive(Debug)]
pub enum SampleResponse {
    /// Fire-and-forget progress feedback (0..=100). Not buffered; dropped if
    /// the request is no longer pending.
    Progress { id: RequestId, percent: u32 },
    /// Terminal success: ownership of the buffer moves to the waiter
    Result { id: RequestId, points: PointSet },
    /// Terminal failure
    Error { id: RequestId, error: EngineError },
}

impl SampleResponse {
    pub fn id(&self) -> RequestId {
        match self {
            Self::Progress { id, .. } | Self::Result { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}
