//! Row-wise min-max scaling of a feature vector.
//!
//! Each row is scaled by its own minimum and maximum across the nine feature
//! values, not per column across the dataset. Feature magnitudes are therefore
//! relative within a recording rather than comparable between recordings.

use super::features::{FEATURE_KEYS, SpectralFeatures};
use super::AnalysisError;

/// Scale a feature row into `[0, 1]` using the row's own extremes.
///
/// The minimum and maximum are taken once from the input row; the smallest
/// value maps to exactly 0 and the largest to exactly 1.
pub fn normalize(features: &SpectralFeatures) -> Result<SpectralFeatures, AnalysisError> {
    let values = features.values();
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(AnalysisError::NonFinite {
            feature: FEATURE_KEYS[idx],
        });
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range == 0.0 {
        return Err(AnalysisError::DegenerateVector { value: min });
    }
    let scaled = values.map(|v| {
        if v == min {
            0.0
        } else if v == max {
            1.0
        } else {
            ((v - min) / range).clamp(0.0, 1.0)
        }
    });
    Ok(SpectralFeatures::from_values(scaled))
}
