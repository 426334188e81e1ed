//! Seeded uniform sphere-surface generation

use crate::sampler::point_set::PointSet;
use crate::sampler::rng::Mulberry32;
use crate::sampler::sort::{apply_permutation, spherical_sort_indices};

/// Rejected draws: below this the disk sample sits on the degenerate pole.
const MIN_DISK_RADIUS_SQ: f64 = 1e-12;

/// Generate `point_count` points uniformly distributed on a sphere surface,
/// ordered by the spherical sort key.
///
/// Rejection sampling on the unit disk (draw `(u, v)` in [-1,1]^2, accept
/// when `u^2 + v^2` lands in (0, 1]) feeds the Marsaglia map:
///
/// ```text
/// factor = 2*sqrt(1-s)
/// x = u*factor*r,  y = v*factor*r,  z = (1-2s)*r
/// ```
///
/// Acceptance probability is pi/4, so the loop runs until exactly
/// `point_count` points are produced rather than assuming a fixed number of
/// attempts. The same seed always yields the same buffer, bit for bit.
pub fn generate_sphere_sorted(point_count: usize, radius: f32, seed: u32) -> PointSet {
    let mut rng = Mulberry32::new(seed);
    let r = f64::from(radius);

    let mut positions = vec![0.0_f32; point_count * 3];
    let mut phi = vec![0.0_f32; point_count];
    let mut theta = vec![0.0_f32; point_count];
    let mut dist = vec![0.0_f32; point_count];

    let mut produced = 0;
    while produced < point_count {
        let u = rng.next_f64() * 2.0 - 1.0;
        let v = rng.next_f64() * 2.0 - 1.0;
        let s = u * u + v * v;
        if !(MIN_DISK_RADIUS_SQ..=1.0).contains(&s) {
            continue;
        }

        let factor = 2.0 * (1.0 - s).sqrt();
        let x = u * factor * r;
        let y = v * factor * r;
        let z = (1.0 - 2.0 * s) * r;

        let base = produced * 3;
        positions[base] = x as f32;
        positions[base + 1] = y as f32;
        positions[base + 2] = z as f32;

        let d = if r == 0.0 { 1.0 } else { r };
        dist[produced] = r as f32;
        theta[produced] = y.atan2(x) as f32;
        phi[produced] = (z / d).clamp(-1.0, 1.0).acos() as f32;

        produced += 1;
    }

    let indices = spherical_sort_indices(&phi, &theta, &dist);
    PointSet::from_vec(apply_permutation(&positions, &indices))
}
