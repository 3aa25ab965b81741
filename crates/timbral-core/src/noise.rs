//! Seedable white-noise source.

/// Xorshift32 pseudo-random generator producing uniform noise.
///
/// Deterministic for a given seed, which keeps string excitation and drum
/// noise bursts reproducible under test. Not suitable for anything beyond
/// audio noise.
///
/// # Example
///
/// ```rust
/// use timbral_core::NoiseSource;
///
/// let mut noise = NoiseSource::new(7);
/// let x = noise.next_bipolar();
/// assert!((-1.0..=1.0).contains(&x));
/// ```
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u32,
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}

impl NoiseSource {
    /// Create a generator from a seed. A zero seed is replaced, since
    /// xorshift never leaves the all-zero state.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x1234_5678 } else { seed },
        }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform sample in [0, 1).
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        // 24 high bits keep the result exactly representable in f32
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    /// Uniform sample in [-1, 1).
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_unit() * 2.0 - 1.0
    }
}
