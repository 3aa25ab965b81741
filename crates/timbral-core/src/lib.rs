//! Timbral Core - DSP primitives for the timbral synthesis engine
//!
//! This crate holds the small, allocation-free building blocks that the
//! synthesis and analysis crates are assembled from.
//!
//! # Filters
//!
//! - [`ChamberlinSvf`] - Two-integrator state-variable filter with a clamped
//!   frequency coefficient, used for per-voice tone shaping
//!
//! # Waveshaping and Levels
//!
//! - [`soft_clip`] / [`hard_clip`] - Bounded saturation and limiting
//! - [`drive`] - Normalized tanh distortion used on the master bus
//! - [`semitones_to_ratio`] - Equal-tempered pitch ratios
//!
//! # PCM
//!
//! - [`encode_pcm16_be`] - Float samples to signed 16-bit big-endian bytes
//! - [`decode_pcm16_le`] - Signed 16-bit little-endian bytes to float samples
//!
//! # Noise
//!
//! - [`NoiseSource`] - Seedable xorshift generator for excitation bursts
//!
//! # no_std Support
//!
//! Disable the default `std` feature to use the crate on embedded targets:
//!
//! ```toml
//! [dependencies]
//! timbral-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod math;
pub mod noise;
pub mod pcm;
pub mod svf;

pub use math::{drive, hard_clip, semitones_to_ratio, soft_clip};
pub use noise::NoiseSource;
pub use pcm::{decode_pcm16_le, encode_pcm16_be, sample_to_i16};
pub use svf::ChamberlinSvf;
