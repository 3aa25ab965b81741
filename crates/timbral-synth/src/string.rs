//! Karplus-Strong plucked string.
//!
//! A delay line of `round(sample_rate / frequency)` samples is filled with a
//! burst of noise. Each tick the head sample is averaged with the previous
//! output (a one-pole lowpass), fed back into the tail, and scaled by an
//! exponential decay envelope. The averaging darkens the tone a little on
//! every pass around the loop, which is what makes it sound plucked.

use std::collections::VecDeque;

use libm::expf;
use timbral_core::NoiseSource;

/// Time constant of the output decay envelope, in seconds.
pub const DECAY_SECONDS: f32 = 0.4;

/// Envelope level at or below which a string is considered silent.
pub const ACTIVE_FLOOR: f32 = 0.005;

/// Hard lifetime of a pluck in seconds.
pub const MAX_LIFETIME_SECONDS: f32 = 2.0;

/// One plucked string.
///
/// A string is created per pluck and dropped by its owner once
/// [`is_active`](Self::is_active) turns false.
#[derive(Debug, Clone)]
pub struct PluckedString {
    buffer: VecDeque<f32>,
    previous: f32,
    tick: u32,
    max_ticks: u32,
    sample_rate: f32,
    frequency: f32,
}

impl PluckedString {
    /// Pluck a string at `frequency` Hz.
    ///
    /// The delay line holds `round(sample_rate / frequency)` samples (at
    /// least two) of uniform noise in [−0.5, 0.5] scaled by `energy`.
    pub fn new(sample_rate: f32, frequency: f32, energy: f32, noise: &mut NoiseSource) -> Self {
        let length = libm::roundf(sample_rate / frequency).max(2.0) as usize;
        let buffer = (0..length)
            .map(|_| (noise.next_unit() - 0.5) * energy)
            .collect();

        Self {
            buffer,
            previous: 0.0,
            tick: 0,
            max_ticks: (MAX_LIFETIME_SECONDS * sample_rate) as u32,
            sample_rate,
            frequency,
        }
    }

    /// Frequency the string was plucked at.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Delay line length in samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the delay line is empty. Never true for a constructed string.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Current decay envelope, `exp(−tick / (sample_rate · 0.4))`.
    pub fn envelope(&self) -> f32 {
        expf(-(self.tick as f32) / (self.sample_rate * DECAY_SECONDS))
    }

    /// Whether the string is still audible.
    pub fn is_active(&self) -> bool {
        self.tick < self.max_ticks && self.envelope() > ACTIVE_FLOOR
    }

    /// Produce one sample. Returns 0 once the string has died out.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        let head = self.buffer.pop_front().unwrap_or(0.0);
        let y = 0.5 * (head + self.previous);
        self.previous = y;
        self.buffer.push_back(y);

        let out = y * self.envelope();
        self.tick += 1;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 96000.0;

    #[test]
    fn test_buffer_length_rounds() {
        let mut noise = NoiseSource::new(1);
        // 96000 / 440 = 218.18
        assert_eq!(PluckedString::new(SR, 440.0, 1.0, &mut noise).len(), 218);
        // 96000 / 82.41 = 1164.91
        assert_eq!(PluckedString::new(SR, 82.41, 1.0, &mut noise).len(), 1165);
    }

    #[test]
    fn test_initial_noise_scaled_by_energy() {
        let mut noise = NoiseSource::new(9);
        let string = PluckedString::new(SR, 220.0, 0.15, &mut noise);
        assert!(
            string.buffer.iter().all(|s| s.abs() <= 0.075),
            "sympathetic pluck exceeded its energy"
        );
        assert!(string.buffer.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_first_output_averages_with_zero() {
        let mut noise = NoiseSource::new(3);
        let mut string = PluckedString::new(SR, 1000.0, 1.0, &mut noise);
        let head = string.buffer[0];
        let y = string.next_sample();
        assert!((y - head * 0.5).abs() < 1e-7, "expected {}, got {}", head * 0.5, y);
        assert_eq!(string.len(), 96, "length is preserved");
    }

    #[test]
    fn test_envelope_decays_exponentially() {
        let mut noise = NoiseSource::new(5);
        let mut string = PluckedString::new(SR, 440.0, 1.0, &mut noise);
        for _ in 0..(0.4 * SR) as usize {
            string.next_sample();
        }
        let env = string.envelope();
        assert!(
            (env - expf(-1.0)).abs() < 1e-3,
            "one time constant should leave e^-1, got {}",
            env
        );
    }

    #[test]
    fn test_string_dies_within_two_seconds() {
        let mut noise = NoiseSource::new(11);
        let mut string = PluckedString::new(SR, 440.0, 1.0, &mut noise);
        let mut samples = 0usize;
        while string.is_active() {
            string.next_sample();
            samples += 1;
        }
        assert!(samples <= (2.0 * SR) as usize, "string rang {} samples", samples);
        assert_eq!(string.next_sample(), 0.0);
    }

    #[test]
    fn test_short_delay_line_floor() {
        let mut noise = NoiseSource::new(2);
        let string = PluckedString::new(SR, 90_000.0, 1.0, &mut noise);
        assert_eq!(string.len(), 2);
    }
}
