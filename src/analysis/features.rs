use serde::{Deserialize, Serialize};

use super::spectrum::Spectrum;
use super::{AnalysisError, stats};

/// Number of spectral descriptors per recording.
pub const FEATURE_COUNT: usize = 9;

/// Column names of the feature vector, in storage order.
pub const FEATURE_KEYS: [&str; FEATURE_COUNT] = [
    "mean", "std", "median", "max", "min", "skewness", "kurtosis", "dfrange", "modindx",
];

/// Statistical descriptors of a magnitude spectrum.
///
/// Field order matches [`FEATURE_KEYS`] and never changes between recordings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralFeatures {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    /// Biased sample skewness `m3 / m2^1.5`.
    pub skewness: f64,
    /// Biased excess kurtosis `m4 / m2^2 - 3`.
    pub kurtosis: f64,
    /// `max - min`.
    pub dfrange: f64,
    /// `std(diff) / mean(diff)` over the first-difference sequence.
    pub modindx: f64,
}

impl SpectralFeatures {
    /// Values in [`FEATURE_KEYS`] order.
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.mean,
            self.std,
            self.median,
            self.max,
            self.min,
            self.skewness,
            self.kurtosis,
            self.dfrange,
            self.modindx,
        ]
    }

    /// Rebuild a record from values in [`FEATURE_KEYS`] order.
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        let [mean, std, median, max, min, skewness, kurtosis, dfrange, modindx] = values;
        Self {
            mean,
            std,
            median,
            max,
            min,
            skewness,
            kurtosis,
            dfrange,
            modindx,
        }
    }

    /// `(key, value)` pairs in storage order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_KEYS.into_iter().zip(self.values())
    }
}

/// Describe the magnitude of a complex spectrum.
pub fn extract_features(spectrum: &Spectrum) -> Result<SpectralFeatures, AnalysisError> {
    features_from_magnitudes(&spectrum.magnitudes())
}

/// Describe a non-negative magnitude sequence.
pub fn features_from_magnitudes(magnitudes: &[f64]) -> Result<SpectralFeatures, AnalysisError> {
    if magnitudes.is_empty() {
        return Err(AnalysisError::EmptySignal);
    }
    let mean = stats::mean(magnitudes);
    let m2 = stats::central_moment(magnitudes, mean, 2);
    if m2 == 0.0 {
        return Err(AnalysisError::UndefinedFeature {
            feature: "skewness",
        });
    }
    let m3 = stats::central_moment(magnitudes, mean, 3);
    let m4 = stats::central_moment(magnitudes, mean, 4);
    let max = magnitudes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = magnitudes.iter().copied().fold(f64::INFINITY, f64::min);

    let diff = stats::first_difference(magnitudes);
    let diff_mean = stats::mean(&diff);
    if diff.is_empty() || diff_mean == 0.0 {
        return Err(AnalysisError::UndefinedFeature { feature: "modindx" });
    }

    Ok(SpectralFeatures {
        mean,
        std: m2.sqrt(),
        median: stats::median(magnitudes),
        max,
        min,
        skewness: m3 / m2.powf(1.5),
        kurtosis: m4 / (m2 * m2) - 3.0,
        dfrange: max - min,
        modindx: stats::std(&diff) / diff_mean,
    })
}
