//! In-place radix-2 FFT.
//!
//! Decimation in time: the input is permuted into bit-reversed order, then
//! combined by butterflies in stages of size 2, 4, ..., N. Within a block the
//! twiddle factor is rotated by complex multiplication with a per-stage step
//! instead of calling `sin`/`cos` for every butterfly.
//!
//! Arithmetic is `f64` throughout; input frames arrive as `f32`.

use std::f64::consts::PI;

use crate::{AnalysisError, Result};

/// Radix-2 transform of a fixed power-of-two size.
///
/// Owns its scratch buffers, so [`magnitudes`](Self::magnitudes) does not
/// allocate after construction.
#[derive(Debug, Clone)]
pub struct Fft {
    size: usize,
    levels: u32,
    real: Vec<f64>,
    imag: Vec<f64>,
}

impl Fft {
    /// Create a transform of `size` points.
    ///
    /// Fails with [`AnalysisError::NotPowerOfTwo`] unless `size` is a power
    /// of two, and with [`AnalysisError::TooSmall`] for sizes below 2.
    pub fn new(size: usize) -> Result<Self> {
        if !size.is_power_of_two() {
            return Err(AnalysisError::NotPowerOfTwo(size));
        }
        if size < 2 {
            return Err(AnalysisError::TooSmall { size, min: 2 });
        }
        Ok(Self {
            size,
            levels: size.trailing_zeros(),
            real: vec![0.0; size],
            imag: vec![0.0; size],
        })
    }

    /// Transform size N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a complex signal, in place.
    ///
    /// Both slices must hold exactly N values.
    pub fn transform(&self, real: &mut [f64], imag: &mut [f64]) {
        let n = self.size;
        debug_assert!(
            real.len() == n && imag.len() == n,
            "FFT buffers must hold {} values",
            n
        );

        let shift = usize::BITS - self.levels;
        for i in 0..n {
            let j = i.reverse_bits() >> shift;
            if j > i {
                real.swap(i, j);
                imag.swap(i, j);
            }
        }

        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let angle = -2.0 * PI / size as f64;
            let (step_i, step_r) = angle.sin_cos();

            for start in (0..n).step_by(size) {
                let (mut w_r, mut w_i) = (1.0, 0.0);
                for j in 0..half {
                    let even = start + j;
                    let odd = even + half;

                    let t_r = real[odd] * w_r - imag[odd] * w_i;
                    let t_i = real[odd] * w_i + imag[odd] * w_r;

                    real[odd] = real[even] - t_r;
                    imag[odd] = imag[even] - t_i;
                    real[even] += t_r;
                    imag[even] += t_i;

                    let next_r = w_r * step_r - w_i * step_i;
                    w_i = w_r * step_i + w_i * step_r;
                    w_r = next_r;
                }
            }
            size <<= 1;
        }
    }

    /// Magnitude spectrum of a real frame.
    ///
    /// `input` is copied into the scratch buffer, truncated or zero-padded
    /// to N. Writes `hypot(re, im)` for bins `0..N/2` into `out`, which must
    /// hold N/2 values.
    pub fn magnitudes(&mut self, input: &[f32], out: &mut [f64]) {
        let n = self.size;
        debug_assert_eq!(out.len(), n / 2, "magnitude buffer must hold N/2 values");

        let copied = input.len().min(n);
        for (dst, &src) in self.real.iter_mut().zip(&input[..copied]) {
            *dst = f64::from(src);
        }
        self.real[copied..].fill(0.0);
        self.imag.fill(0.0);

        let mut real = std::mem::take(&mut self.real);
        let mut imag = std::mem::take(&mut self.imag);
        self.transform(&mut real, &mut imag);

        for ((mag, re), im) in out.iter_mut().zip(&real).zip(&imag).take(n / 2) {
            *mag = re.hypot(*im);
        }

        self.real = real;
        self.imag = imag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert_eq!(Fft::new(1000).unwrap_err(), AnalysisError::NotPowerOfTwo(1000));
        assert_eq!(Fft::new(0).unwrap_err(), AnalysisError::NotPowerOfTwo(0));
        assert!(matches!(Fft::new(1), Err(AnalysisError::TooSmall { .. })));
        assert!(Fft::new(2).is_ok());
    }

    #[test]
    fn test_impulse_is_flat() {
        let mut fft = Fft::new(16).unwrap();
        let mut input = [0.0f32; 16];
        input[0] = 1.0;
        let mut out = [0.0f64; 8];
        fft.magnitudes(&input, &mut out);
        for (k, m) in out.iter().enumerate() {
            assert!((m - 1.0).abs() < 1e-12, "bin {} = {}", k, m);
        }
    }

    #[test]
    fn test_dc_lands_in_bin_zero() {
        let mut fft = Fft::new(64).unwrap();
        let mut out = [0.0f64; 32];
        fft.magnitudes(&[0.5f32; 64], &mut out);
        assert!((out[0] - 32.0).abs() < 1e-9);
        assert!(out[1..].iter().all(|m| m.abs() < 1e-9));
    }

    #[test]
    fn test_cosine_at_bin() {
        let n = 256;
        let mut fft = Fft::new(n).unwrap();
        let k = 13;
        let input: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * k as f64 * i as f64 / n as f64).cos() as f32)
            .collect();
        let mut out = vec![0.0f64; n / 2];
        fft.magnitudes(&input, &mut out);
        // A unit cosine puts N/2 in its bin
        assert!((out[k] - n as f64 / 2.0).abs() < 1e-3, "bin {} = {}", k, out[k]);
        for (i, m) in out.iter().enumerate().filter(|(i, _)| *i != k) {
            assert!(*m < 1e-3, "leakage in bin {}: {}", i, m);
        }
    }

    #[test]
    fn test_short_input_zero_padded() {
        let mut fft = Fft::new(8).unwrap();
        let mut a = [0.0f64; 4];
        let mut b = [0.0f64; 4];
        fft.magnitudes(&[1.0, 1.0], &mut a);
        fft.magnitudes(&[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_scratch_reused_between_frames() {
        let mut fft = Fft::new(32).unwrap();
        let mut first = [0.0f64; 16];
        let mut again = [0.0f64; 16];
        let frame: Vec<f32> = (0..32).map(|i| (i as f32 * 0.3).sin()).collect();
        fft.magnitudes(&frame, &mut first);
        fft.magnitudes(&[0.9f32; 32], &mut [0.0; 16]);
        fft.magnitudes(&frame, &mut again);
        assert_eq!(first, again);
    }
}
