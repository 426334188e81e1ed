//! Spatial sampling for morphable point clouds
//!
//! Pure algorithms: no I/O, no GPU state. The compute worker runs these off
//! the render thread; tests run them directly.

mod mesh;
mod point_set;
mod rng;
mod sort;
mod sphere;

pub use mesh::sample_mesh_to_sphere;
pub use point_set::PointSet;
pub use rng::Mulberry32;
pub use sort::{apply_permutation, spherical_sort_indices, SORT_TOLERANCE};
pub use sphere::generate_sphere_sorted;
