//! Spherical ordering shared by every sampled point set
//!
//! Both the generated sphere and the mesh-derived set are sorted by the same
//! (phi, theta, distance) key before they leave the sampler. That common
//! ordering is the contract that makes index i in one set angularly
//! comparable to index i in the other, which is what keeps a morph between
//! them continuous.

/// Bucket width for the angular keys. Angles in the same bucket are ties
/// broken by the next key.
pub const SORT_TOLERANCE: f32 = 0.001;

/// Quantize an angle onto the tolerance grid. Comparing buckets instead of
/// raw differences keeps the comparator a total order, which the std sort
/// requires; pairwise `|a - b| > tolerance` checks are intransitive and
/// panic on large inputs.
fn bucket(angle: f32) -> i64 {
    (angle / SORT_TOLERANCE).floor() as i64
}

/// Compute the index permutation that sorts points by phi bucket, then
/// theta bucket (see [`SORT_TOLERANCE`]), then radial distance.
///
/// The underlying sort is stable, so runs of equal keys keep their relative
/// order; sorting an already-sorted set is a no-op.
pub fn spherical_sort_indices(phi: &[f32], theta: &[f32], dist: &[f32]) -> Vec<u32> {
    debug_assert_eq!(phi.len(), theta.len());
    debug_assert_eq!(phi.len(), dist.len());

    let mut indices: Vec<u32> = (0..phi.len() as u32).collect();
    indices.sort_by(|&a, &b| {
        let (a, b) = (a as usize, b as usize);
        bucket(phi[a])
            .cmp(&bucket(phi[b]))
            .then_with(|| bucket(theta[a]).cmp(&bucket(theta[b])))
            .then_with(|| dist[a].total_cmp(&dist[b]))
    });
    indices
}

/// Remap a flat xyz buffer through a permutation: output point i is input
/// point `indices[i]`.
pub fn apply_permutation(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut remapped = vec![0.0_f32; positions.len()];
    for (i, &src) in indices.iter().enumerate() {
        let src = src as usize * 3;
        let dst = i * 3;
        remapped[dst..dst + 3].copy_from_slice(&positions[src..src + 3]);
    }
    remapped
}
