//! Mesh-derived point sampling
//!
//! Takes the raw vertex positions of a binary mesh, fits them into a target
//! sphere, and orders them with the same spherical sort the generated sphere
//! uses so the two sets morph index-for-index.

use glam::Vec3;

use crate::sampler::point_set::PointSet;
use crate::sampler::sort::{apply_permutation, spherical_sort_indices};

/// Fraction of the target radius the fitted model occupies, leaving a margin
/// inside the enclosing sphere state.
const FIT_MARGIN: f32 = 0.8;

/// Source vertex index for output point `i`.
///
/// Downsampling (`vertex_count >= point_count`) strides through the source;
/// upsampling cycles through it. A model with fewer vertices than requested
/// points degrades to repeated samples, never an error.
fn source_index(i: usize, vertex_count: usize, point_count: usize) -> usize {
    if vertex_count >= point_count {
        let stride = vertex_count as f64 / point_count as f64;
        (i as f64 * stride).floor() as usize
    } else {
        i % vertex_count
    }
}

/// Sample `point_count` points from `vertices` (flat xyz triples), centered,
/// scaled to `target_radius * 0.8`, reoriented, and spherically sorted.
///
/// The transform pipeline per point: subtract the bounding-box center, apply
/// the uniform bounding-sphere scale, then rotate -90 degrees about X
/// (`(x, y, z) -> (x, z, -y)`) to map the asset's Z-up convention onto the
/// scene's Y-up one.
pub fn sample_mesh_to_sphere(vertices: &[f32], point_count: usize, target_radius: f32) -> PointSet {
    debug_assert!(vertices.len() % 3 == 0, "vertex buffer length not xyz-aligned");
    let vertex_count = vertices.len() / 3;
    if vertex_count == 0 || point_count == 0 {
        log::warn!("mesh sampling requested with no data (vertices: {vertex_count}, points: {point_count})");
        return PointSet::zeroed(point_count);
    }

    let vertex = |i: usize| Vec3::new(vertices[i * 3], vertices[i * 3 + 1], vertices[i * 3 + 2]);

    // Axis-aligned bounding box -> center + bounding-sphere radius
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for i in 0..vertex_count {
        let v = vertex(i);
        min = min.min(v);
        max = max.max(v);
    }
    let center = (min + max) * 0.5;

    let mut max_radius_sq = 0.0_f32;
    for i in 0..vertex_count {
        max_radius_sq = max_radius_sq.max(vertex(i).distance_squared(center));
    }
    let bounding_radius = max_radius_sq.sqrt();
    // Degenerate cloud (all vertices coincident): avoid dividing by zero
    let bounding_radius = if bounding_radius == 0.0 { 1.0 } else { bounding_radius };
    let scale = target_radius * FIT_MARGIN / bounding_radius;

    let mut positions = vec![0.0_f32; point_count * 3];
    let mut phi = vec![0.0_f32; point_count];
    let mut theta = vec![0.0_f32; point_count];
    let mut dist = vec![0.0_f32; point_count];

    for i in 0..point_count {
        let src = vertex(source_index(i, vertex_count, point_count));
        let fitted = (src - center) * scale;
        let p = Vec3::new(fitted.x, fitted.z, -fitted.y);

        let base = i * 3;
        positions[base] = p.x;
        positions[base + 1] = p.y;
        positions[base + 2] = p.z;

        let d = p.length();
        let d = if d == 0.0 { 1.0 } else { d };
        dist[i] = d;
        theta[i] = p.y.atan2(p.x);
        phi[i] = (p.z / d).clamp(-1.0, 1.0).acos();
    }

    let indices = spherical_sort_indices(&phi, &theta, &dist);
    PointSet::from_vec(apply_permutation(&positions, &indices))
}
