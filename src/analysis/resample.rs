use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// Algorithm used to change the sample rate of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Band-limited resampling in the frequency domain.
    #[default]
    Fft,
    /// Linear interpolation between neighbouring samples.
    Linear,
}

/// Resample `samples` from `source_rate` to `target_rate`.
///
/// Equal rates return the input unchanged. The FFT method produces
/// `ceil(len * target / source)` samples, the linear method `round(...)`.
pub fn resample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
    method: ResampleMethod,
) -> Result<Vec<f32>, AnalysisError> {
    if source_rate == 0 || target_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate {
            source_rate,
            target_rate,
        });
    }
    if samples.is_empty() {
        return Err(AnalysisError::EmptySignal);
    }
    if source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let out = match method {
        ResampleMethod::Fft => {
            let out_len = (samples.len() as u64 * target_rate as u64).div_ceil(source_rate as u64);
            resample_fft(samples, out_len.max(1) as usize)
        }
        ResampleMethod::Linear => {
            let mut out = Vec::new();
            resample_linear_into(&mut out, samples, source_rate, target_rate);
            out
        }
    };
    Ok(out)
}

/// Fourier-domain resampling to exactly `out_len` samples.
///
/// The spectrum is truncated or zero-extended; an even-length Nyquist bin is
/// doubled when downsampling and halved when upsampling so the real signal keeps
/// its energy, and the result is scaled by `out_len / in_len`.
pub(crate) fn resample_fft(samples: &[f32], out_len: usize) -> Vec<f32> {
    let in_len = samples.len();
    if in_len == 0 || out_len == 0 {
        return Vec::new();
    }
    if in_len == out_len {
        return samples.to_vec();
    }
    let mut planner = FftPlanner::<f64>::new();

    let mut spectrum: Vec<Complex<f64>> = samples
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    planner.plan_fft_forward(in_len).process(&mut spectrum);

    // One-sided spectrum of the output, bins 0..=out_len/2.
    let mut half = vec![Complex::new(0.0, 0.0); out_len / 2 + 1];
    let shared = in_len.min(out_len);
    let nyquist = shared / 2 + 1;
    half[..nyquist].copy_from_slice(&spectrum[..nyquist]);
    if shared % 2 == 0 {
        if out_len < in_len {
            half[shared / 2] *= 2.0;
        } else {
            half[shared / 2] *= 0.5;
        }
    }

    let mut full = vec![Complex::new(0.0, 0.0); out_len];
    for (k, value) in half.iter().enumerate() {
        full[k] = *value;
        let mirror = out_len - k;
        if k > 0 && k < mirror {
            full[mirror] = value.conj();
        }
    }
    planner.plan_fft_inverse(out_len).process(&mut full);

    // rustfft leaves the inverse unnormalized (factor out_len); the amplitude
    // rescale by out_len / in_len folds into a single division by in_len.
    let scale = 1.0 / in_len as f64;
    full.iter().map(|c| (c.re * scale) as f32).collect()
}

pub(crate) fn resample_linear_into(
    out: &mut Vec<f32>,
    samples: &[f32],
    input_rate: u32,
    output_rate: u32,
) {
    let input_rate = input_rate.max(1);
    let output_rate = output_rate.max(1);
    if samples.is_empty() || input_rate == output_rate {
        out.clear();
        out.extend_from_slice(samples);
        return;
    }
    let duration_seconds = samples.len() as f64 / input_rate as f64;
    let out_len = (duration_seconds * output_rate as f64).round().max(1.0) as usize;
    out.clear();
    out.reserve(out_len.saturating_sub(out.capacity()));
    for i in 0..out_len {
        let t = i as f64 / output_rate as f64;
        let pos = t * input_rate as f64;
        out.push(lerp_sample(samples, pos));
    }
}

fn lerp_sample(samples: &[f32], pos: f64) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let idx0 = pos.floor().max(0.0) as usize;
    let frac = (pos - idx0 as f64).clamp(0.0, 1.0) as f32;
    let idx1 = idx0.saturating_add(1).min(samples.len().saturating_sub(1));
    let a = samples.get(idx0).copied().unwrap_or(0.0);
    let b = samples.get(idx1).copied().unwrap_or(a);
    a + (b - a) * frac
}
