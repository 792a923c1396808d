//! Per-recording analysis: resampling, framing, spectral statistics and row normalization.

mod error;
pub mod features;
pub mod normalize;
pub mod padding;
pub mod resample;
pub mod spectrum;
mod stats;

pub use error::AnalysisError;
pub use features::{FEATURE_COUNT, FEATURE_KEYS, SpectralFeatures, extract_features, features_from_magnitudes};
pub use normalize::normalize;
pub use padding::zero_pad;
pub use resample::{ResampleMethod, resample};
pub use spectrum::{Spectrum, transform};

use rand::Rng;

/// Default sample rate every recording is resampled to.
pub const DEFAULT_TARGET_SAMPLE_RATE: u32 = 8_000;

/// Options controlling the signal normalization stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalOptions {
    /// Sample rate after resampling.
    pub target_sample_rate: u32,
    /// Fixed frame length every signal is padded to.
    pub target_length: usize,
    /// Resampling algorithm.
    pub method: ResampleMethod,
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_TARGET_SAMPLE_RATE,
            target_length: DEFAULT_TARGET_SAMPLE_RATE as usize,
            method: ResampleMethod::default(),
        }
    }
}

/// Run the full per-recording chain: resample, pad, transform, describe, normalize.
pub fn analyze_clip<R: Rng>(
    samples: &[f32],
    sample_rate: u32,
    options: &SignalOptions,
    rng: &mut R,
) -> Result<SpectralFeatures, AnalysisError> {
    let resampled = resample(samples, sample_rate, options.target_sample_rate, options.method)?;
    let framed = zero_pad(&resampled, options.target_length, rng)?;
    let spectrum = transform(&framed);
    let features = extract_features(&spectrum)?;
    normalize(&features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn chirp(len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * (200.0 + 400.0 * t) * t).sin() * 1_000.0
            })
            .collect()
    }

    #[test]
    fn analyze_clip_yields_unit_range_row() {
        let options = SignalOptions {
            target_sample_rate: 8_000,
            target_length: 8_000,
            method: ResampleMethod::Fft,
        };
        let samples = chirp(12_000, 16_000);
        let mut rng = StdRng::seed_from_u64(7);
        let row = analyze_clip(&samples, 16_000, &options, &mut rng).unwrap();
        let values = row.values();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn analyze_clip_rejects_recordings_longer_than_frame() {
        let options = SignalOptions {
            target_sample_rate: 8_000,
            target_length: 4_000,
            method: ResampleMethod::Linear,
        };
        let samples = chirp(8_000, 8_000);
        let mut rng = StdRng::seed_from_u64(0);
        let err = analyze_clip(&samples, 8_000, &options, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LengthExceeded {
                length: 8_000,
                target: 4_000
            }
        ));
    }
}
