//! Property-based tests for timbral-analysis.

use proptest::prelude::*;
use timbral_analysis::{Fft, SpectrumAnalyzer};

const SR: f32 = 96000.0;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A tone centered on bin k peaks at exactly k.
    #[test]
    fn centered_tone_peaks_at_its_bin(bin in 3usize..511, amplitude in 0.05f32..1.0) {
        let mut analyzer = SpectrumAnalyzer::new(1024, SR).unwrap();
        let frame: Vec<f32> = (0..1024)
            .map(|i| {
                let phase = ((bin * i) % 1024) as f32 / 1024.0;
                amplitude * (std::f32::consts::TAU * phase).sin()
            })
            .collect();
        analyzer.process(&frame);
        prop_assert_eq!(analyzer.peak_bin(), bin);
        prop_assert_eq!(analyzer.dominant_frequency(), bin as f32 * SR / 1024.0);
    }

    /// Parseval: energy in the time domain equals energy over all bins / N.
    #[test]
    fn transform_preserves_energy(signal in prop::collection::vec(-1.0f32..1.0, 64)) {
        let fft = Fft::new(64).unwrap();
        let mut real: Vec<f64> = signal.iter().map(|&s| f64::from(s)).collect();
        let mut imag = vec![0.0f64; 64];
        let time_energy: f64 = real.iter().map(|x| x * x).sum();

        fft.transform(&mut real, &mut imag);
        let freq_energy: f64 = real
            .iter()
            .zip(&imag)
            .map(|(re, im)| re * re + im * im)
            .sum::<f64>()
            / 64.0;

        prop_assert!((time_energy - freq_energy).abs() < 1e-9 * (1.0 + time_energy));
    }

    /// Magnitudes are finite and non-negative for any bounded frame.
    #[test]
    fn magnitudes_are_finite(signal in prop::collection::vec(-1.0f32..1.0, 0..300)) {
        let mut analyzer = SpectrumAnalyzer::new(256, SR).unwrap();
        let raw = analyzer.process(&signal);
        prop_assert!(raw.iter().all(|m| m.is_finite() && *m >= 0.0));
        prop_assert!(analyzer.peak_bin() >= 2 && analyzer.peak_bin() < 128);
    }
}
