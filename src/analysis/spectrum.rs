use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Full complex DFT of a framed signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    bins: Vec<Complex<f64>>,
}

impl Spectrum {
    pub fn bins(&self) -> &[Complex<f64>] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Element-wise magnitude `|X[k]|`.
    pub fn magnitudes(&self) -> Vec<f64> {
        self.bins.iter().map(|c| c.norm()).collect()
    }
}

impl From<Vec<Complex<f64>>> for Spectrum {
    fn from(bins: Vec<Complex<f64>>) -> Self {
        Self { bins }
    }
}

/// Discrete Fourier transform of `signal` (no window, same length).
pub fn transform(signal: &[f32]) -> Spectrum {
    let mut bins: Vec<Complex<f64>> = signal
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    if !bins.is_empty() {
        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_forward(bins.len()).process(&mut bins);
    }
    Spectrum { bins }
}
