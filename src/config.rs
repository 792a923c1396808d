//! Pipeline configuration loaded from `audiogender.toml`.
//!
//! Every section and key is optional; a missing file yields the defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{DEFAULT_TARGET_SAMPLE_RATE, ResampleMethod, SignalOptions};
use crate::app_dirs;
use crate::dataset::{AssembleOptions, FailurePolicy, SplitMode, SplitOptions};
use crate::ml::gbdt_stump::TrainOptions;

/// Default filename of the pipeline configuration.
pub const CONFIG_FILE_NAME: &str = "audiogender.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Config keys (TOML): `paths`, `signal`, `assembly`, `engineering`, `split`,
/// `model`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub signal: SignalSettings,
    #[serde(default)]
    pub assembly: AssemblySettings,
    #[serde(default)]
    pub engineering: EngineeringSettings,
    #[serde(default)]
    pub split: SplitSettings,
    #[serde(default)]
    pub model: ModelParams,
}

/// Where inputs are read and outputs written.
///
/// Relative paths are resolved against `project_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    #[serde(default = "default_meta_file")]
    pub meta_file: PathBuf,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            audio_dir: default_audio_dir(),
            meta_file: default_meta_file(),
            data_dir: default_data_dir(),
            results_dir: default_results_dir(),
        }
    }
}

impl PathSettings {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.resolve(&self.audio_dir)
    }

    pub fn meta_file(&self) -> PathBuf {
        self.resolve(&self.meta_file)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.data_dir)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.resolve(&self.results_dir)
    }
}

/// Config keys: `target_sample_rate`, `target_length`, `resampler`, `pad_seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSettings {
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: u32,
    /// Frame length in samples; defaults to one second at the target rate.
    #[serde(default)]
    pub target_length: Option<usize>,
    #[serde(default)]
    pub resampler: ResampleMethod,
    #[serde(default)]
    pub pad_seed: u64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            target_sample_rate: default_target_sample_rate(),
            target_length: None,
            resampler: ResampleMethod::default(),
            pad_seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblySettings {
    #[serde(default)]
    pub on_error: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringSettings {
    /// Columns correlating above this (absolute) value are dropped.
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,
}

impl Default for EngineeringSettings {
    fn default() -> Self {
        Self {
            correlation_threshold: default_correlation_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSettings {
    #[serde(default = "default_split_ratio")]
    pub test_ratio: f64,
    #[serde(default = "default_split_ratio")]
    pub val_ratio: f64,
    #[serde(default = "default_split_seed")]
    pub seed: u64,
    #[serde(default)]
    pub mode: SplitMode,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            test_ratio: default_split_ratio(),
            val_ratio: default_split_ratio(),
            seed: default_split_seed(),
            mode: SplitMode::default(),
        }
    }
}

/// Classifier hyperparameters.
///
/// Keys the stump booster does not understand are kept in `extra` and
/// reported at training time instead of failing the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_bins")]
    pub bins: usize,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            n_estimators: default_n_estimators(),
            bins: default_bins(),
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_existing(path)
    }

    /// Load `path`; a missing file is a [`ConfigError::Read`].
    pub fn load_existing(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signal.target_sample_rate == 0 {
            return Err(ConfigError::Invalid {
                key: "signal.target_sample_rate",
                reason: "must be positive".to_string(),
            });
        }
        if self.signal.target_length == Some(0) {
            return Err(ConfigError::Invalid {
                key: "signal.target_length",
                reason: "must be positive".to_string(),
            });
        }
        let threshold = self.engineering.correlation_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "engineering.correlation_threshold",
                reason: format!("{threshold} is outside (0, 1]"),
            });
        }
        if !(self.model.learning_rate.is_finite() && self.model.learning_rate > 0.0) {
            return Err(ConfigError::Invalid {
                key: "model.learning_rate",
                reason: format!("{} must be a positive number", self.model.learning_rate),
            });
        }
        if self.model.n_estimators == 0 {
            return Err(ConfigError::Invalid {
                key: "model.n_estimators",
                reason: "must be positive".to_string(),
            });
        }
        if !(2..=256).contains(&self.model.bins) {
            return Err(ConfigError::Invalid {
                key: "model.bins",
                reason: format!("{} is outside 2..=256", self.model.bins),
            });
        }
        self.split_options()
            .validate()
            .map_err(|err| ConfigError::Invalid {
                key: "split.test_ratio/val_ratio",
                reason: err.to_string(),
            })?;
        Ok(())
    }

    pub fn signal_options(&self) -> SignalOptions {
        SignalOptions {
            target_sample_rate: self.signal.target_sample_rate,
            target_length: self
                .signal
                .target_length
                .unwrap_or(self.signal.target_sample_rate as usize),
            method: self.signal.resampler,
        }
    }

    pub fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            signal: self.signal_options(),
            on_error: self.assembly.on_error,
            pad_seed: self.signal.pad_seed,
        }
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            test_ratio: self.split.test_ratio,
            val_ratio: self.split.val_ratio,
            seed: self.split.seed,
            mode: self.split.mode,
        }
    }

    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            rounds: self.model.n_estimators,
            learning_rate: self.model.learning_rate,
            bins: self.model.bins,
        }
    }
}

/// `<app dir>/audiogender.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(|_| ConfigError::NoConfigDir)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("audio")
}

fn default_meta_file() -> PathBuf {
    PathBuf::from("audio").join("audioMNIST_meta.txt")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_target_sample_rate() -> u32 {
    DEFAULT_TARGET_SAMPLE_RATE
}

fn default_correlation_threshold() -> f64 {
    0.95
}

fn default_split_ratio() -> f64 {
    0.1
}

fn default_split_seed() -> u64 {
    42
}

fn default_learning_rate() -> f32 {
    0.1
}

fn default_n_estimators() -> usize {
    100
}

fn default_bins() -> usize {
    32
}
