//! Request processing on the compute pool
//!
//! Each request runs to a single terminal response. Mesh loads report a
//! combined progress budget: the download occupies 0-60%, parsing and
//! sampling the remainder, so one percentage can drive a loading indicator
//! across both phases.

use crossbeam_channel::Sender;

use crate::compute::protocol::{RequestId, SampleRequest, SampleResponse};
use crate::error::EngineResult;
use crate::loader::StreamingMeshLoader;
use crate::sampler::{generate_sphere_sorted, sample_mesh_to_sphere, PointSet};

/// Portion of the combined progress budget attributed to the download phase
const DOWNLOAD_BUDGET: u32 = 60;
/// Reported once the buffer is in memory, before sampling begins
const PARSE_STARTED: u32 = 70;

/// Process one request, emitting progress along the way and exactly one
/// terminal response.
pub(crate) fn handle_request(
    loader: &StreamingMeshLoader,
    id: RequestId,
    request: SampleRequest,
    responses: &Sender<SampleResponse>,
) {
    let outcome = run(loader, id, &request, responses);
    let terminal = match outcome {
        Ok(points) => SampleResponse::Result { id, points },
        Err(error) => {
            log::warn!("compute request {id} failed: {error}");
            SampleResponse::Error { id, error }
        }
    };
    // The router may already be gone during teardown
    let _ = responses.send(terminal);
}

fn run(
    loader: &StreamingMeshLoader,
    id: RequestId,
    request: &SampleRequest,
    responses: &Sender<SampleResponse>,
) -> EngineResult<PointSet> {
    let post_progress = |percent: u32| {
        let _ = responses.send(SampleResponse::Progress { id, percent });
    };

    match request {
        SampleRequest::GenerateSphere {
            point_count,
            radius,
            seed,
        } => Ok(generate_sphere_sorted(*point_count, *radius, *seed)),

        SampleRequest::LoadAndSampleMesh {
            url,
            point_count,
            target_radius,
        } => {
            post_progress(0);
            let bytes = loader.fetch_bytes(url, &mut |download_pct| {
                post_progress(download_pct * DOWNLOAD_BUDGET / 100);
            })?;
            post_progress(PARSE_STARTED);
            let vertices = loader.parse_vertices(&bytes)?;
            let points = sample_mesh_to_sphere(&vertices, *point_count, *target_radius);
            post_progress(100);
            Ok(points)
        }
    }
}
