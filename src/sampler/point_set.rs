/// A flat, ordered sequence of 3D float coordinates (length = count * 3).
///
/// Two point sets with the same count and compatible spherical ordering can
/// be morphed index-for-index without visible point teleportation. A
/// `PointSet` is exclusively owned by whoever holds it; transferring one
/// through the compute channel moves the backing `Vec`, never copies it.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    data: Vec<f32>,
    point_count: usize,
}

impl PointSet {
    /// Wrap an existing xyz buffer. The length must be a multiple of 3.
    pub fn from_vec(data: Vec<f32>) -> Self {
        debug_assert!(data.len() % 3 == 0, "point buffer length not xyz-aligned");
        let point_count = data.len() / 3;
        Self { data, point_count }
    }

    /// An all-zero set of `point_count` points. This is the deterministic
    /// fallback shape substituted when sampling fails, so downstream GPU
    /// buffers are never left undefined.
    pub fn zeroed(point_count: usize) -> Self {
        Self {
            data: vec![0.0; point_count * 3],
            point_count,
        }
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// The xyz triple at point index `i`
    pub fn point(&self, i: usize) -> [f32; 3] {
        let base = i * 3;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }

    pub fn fill_zero(&mut self) {
        self.data.fill(0.0);
    }

    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|v| *v == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_has_expected_shape() {
        let set = PointSet::zeroed(7);
        assert_eq!(set.point_count(), 7);
        assert_eq!(set.as_slice().len(), 21);
        assert!(set.is_all_zero());
    }

    #[test]
    fn point_indexing() {
        let set = PointSet::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(set.point_count(), 2);
        assert_eq!(set.point(1), [4.0, 5.0, 6.0]);
    }
}
