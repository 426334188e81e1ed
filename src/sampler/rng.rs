//! Deterministic 32-bit PRNG for reproducible point sets
//!
//! The sphere sampler must yield bit-identical output for a given seed across
//! calls and processes: the "sphere" morph state is reconstructed locally
//! instead of being fetched, so both ends of a morph have to agree on every
//! coordinate. General-purpose RNGs (e.g. `rand::rngs::SmallRng`) explicitly
//! reserve the right to change sequences between versions, so the generator
//! is pinned here as part of the sampling contract.

/// Mulberry32 generator. One `u32` of state, full 2^32 period.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Create a generator from a seed. A zero seed is coerced to 1 so the
    /// all-zero state never occurs.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Next raw 32-bit draw
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let s = self.state;
        let mut t = s ^ (s >> 15);
        t = t.wrapping_mul(s | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next draw mapped to [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}
