use thiserror::Error;

/// Per-recording failures raised by the analysis stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// Resampled signal does not fit in the analysis frame.
    #[error("signal length {length} exceeds frame length {target}")]
    LengthExceeded { length: usize, target: usize },
    /// A statistic cannot be computed for this spectrum.
    #[error("feature `{feature}` is undefined for this spectrum")]
    UndefinedFeature { feature: &'static str },
    /// All feature values are equal, so min-max scaling divides by zero.
    #[error("feature row is constant ({value}); min-max scaling is undefined")]
    DegenerateVector { value: f64 },
    /// A feature value is NaN or infinite.
    #[error("feature `{feature}` is not finite")]
    NonFinite { feature: &'static str },
    #[error("signal is empty")]
    EmptySignal,
    #[error("invalid sample rate: source={source_rate} target={target_rate}")]
    InvalidSampleRate { source_rate: u32, target_rate: u32 },
}
