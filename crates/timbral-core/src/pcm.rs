//! 16-bit PCM conversion.
//!
//! The render path emits signed 16-bit mono samples in big-endian byte
//! order; capture devices hand over signed 16-bit little-endian frames.
//! Both conversions work on caller-provided slices so they can run inside
//! the audio loop without allocating.

/// Convert one float sample to a signed 16-bit value.
///
/// The sample is scaled by `i16::MAX`. Out-of-range input saturates instead
/// of wrapping, and NaN maps to zero.
#[inline]
pub fn sample_to_i16(x: f32) -> i16 {
    (x * f32::from(i16::MAX)) as i16
}

/// Encode float samples as signed 16-bit big-endian PCM.
///
/// Writes `2 * n` bytes where `n = min(samples.len(), out.len() / 2)` and
/// returns `n`.
///
/// # Example
/// ```rust
/// use timbral_core::encode_pcm16_be;
///
/// let mut bytes = [0u8; 4];
/// let written = encode_pcm16_be(&[1.0, -1.0], &mut bytes);
/// assert_eq!(written, 2);
/// assert_eq!(bytes, [0x7f, 0xff, 0x80, 0x01]);
/// ```
pub fn encode_pcm16_be(samples: &[f32], out: &mut [u8]) -> usize {
    let mut written = 0;
    for (sample, pair) in samples.iter().zip(out.chunks_exact_mut(2)) {
        pair.copy_from_slice(&sample_to_i16(*sample).to_be_bytes());
        written += 1;
    }
    written
}

/// Decode signed 16-bit little-endian PCM into float samples.
///
/// Each sample is divided by 32768, giving values in [-1, 1). A trailing
/// odd byte is ignored. Returns the number of samples written to `out`.
///
/// # Example
/// ```rust
/// use timbral_core::decode_pcm16_le;
///
/// let mut out = [0.0f32; 2];
/// let n = decode_pcm16_le(&[0x00, 0x40, 0x00, 0x80], &mut out);
/// assert_eq!(n, 2);
/// assert_eq!(out, [0.5, -1.0]);
/// ```
pub fn decode_pcm16_le(bytes: &[u8], out: &mut [f32]) -> usize {
    let mut decoded = 0;
    for (pair, slot) in bytes.chunks_exact(2).zip(out.iter_mut()) {
        let value = i16::from_le_bytes([pair[0], pair[1]]);
        *slot = f32::from(value) / 32768.0;
        decoded += 1;
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_to_i16_saturates() {
        assert_eq!(sample_to_i16(2.0), i16::MAX);
        assert_eq!(sample_to_i16(-2.0), i16::MIN);
        assert_eq!(sample_to_i16(f32::NAN), 0);
        assert_eq!(sample_to_i16(0.0), 0);
    }

    #[test]
    fn test_encode_big_endian_layout() {
        let mut bytes = [0u8; 2];
        encode_pcm16_be(&[0.5], &mut bytes);
        let value = i16::from_be_bytes(bytes);
        assert_eq!(value, 16383);
        assert_eq!(bytes[0], 0x3f, "high byte first");
    }

    #[test]
    fn test_encode_stops_at_shorter_slice() {
        let mut bytes = [0u8; 3];
        let written = encode_pcm16_be(&[0.1, 0.2, 0.3], &mut bytes);
        assert_eq!(written, 1);
    }

    #[test]
    fn test_decode_ignores_trailing_byte() {
        let mut out = [9.0f32; 4];
        let n = decode_pcm16_le(&[0xff, 0x7f, 0x01], &mut out);
        assert_eq!(n, 1);
        assert!((out[0] - 32767.0 / 32768.0).abs() < 1e-7);
        assert_eq!(out[1], 9.0, "untouched beyond decoded range");
    }
}
