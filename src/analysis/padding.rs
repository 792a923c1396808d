use rand::Rng;

use super::AnalysisError;

/// Embed `samples` into a zero-filled frame of exactly `target_length` samples.
///
/// Shorter signals land at an offset drawn uniformly from
/// `[0, target_length - len)`; a signal of exactly `target_length` is returned
/// as-is. Longer signals are rejected, never truncated.
pub fn zero_pad<R: Rng>(
    samples: &[f32],
    target_length: usize,
    rng: &mut R,
) -> Result<Vec<f32>, AnalysisError> {
    let len = samples.len();
    if len > target_length {
        return Err(AnalysisError::LengthExceeded {
            length: len,
            target: target_length,
        });
    }
    if len == target_length {
        return Ok(samples.to_vec());
    }
    let offset = rng.random_range(0..target_length - len);
    let mut framed = vec![0.0_f32; target_length];
    framed[offset..offset + len].copy_from_slice(samples);
    Ok(framed)
}
