//! morph-engine: offscreen point-cloud sampling and GPU lifecycle management
//!
//! The engine behind morphing point-cloud visuals: a deterministic sphere /
//! mesh sampler whose shared spherical ordering makes two point sets
//! interpolate without visible teleportation, a streaming binary-PLY loader
//! with download progress, a compute channel that keeps heavy sampling off
//! the render thread, and a scene lifecycle manager that tears GPU resources
//! down without leaks or double-frees.
//!
//! The render thread never blocks on sampling: it submits a request, keeps
//! drawing, and uploads the buffer when the pending handle settles.

pub mod cloud;
pub mod compute;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod sampler;

pub use cloud::{CloudConfig, MorphingPointCloud};
pub use compute::{ComputeChannel, PendingSample, RequestId, SampleRequest};
pub use error::{EngineError, EngineResult};
pub use lifecycle::{release_gpu, GpuRelease, ReleaseGuard, SceneGraph, SceneLifecycle, SceneNode};
pub use loader::{HttpMeshSource, MeshSource, StreamingMeshLoader};
pub use sampler::{generate_sphere_sorted, sample_mesh_to_sphere, PointSet};
