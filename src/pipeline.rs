//! Stage orchestration: prepare features, engineer the modelling table, train.
//!
//! Each stage reads the previous stage's CSV from the data directory, so
//! stages can be rerun independently.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::corpus::{CorpusError, SpeakerMetadata, WavCorpus};
use crate::dataset::{
    AssembleError, Assembly, EngineeringError, FeatureTable, LABEL_COLUMN, PersistError,
    SplitError, assemble, engineer, read_dataset, read_table, split, write_dataset, write_table,
};
use crate::ml::gbdt_stump::{TrainDataset, TrainingLog, train_gbdt_stump_with_eval};
use crate::ml::{Evaluation, GENDER_CLASSES, evaluate};

pub const FEATURES_FILE: &str = "features_data.csv";
pub const FINAL_FILE: &str = "final_data.csv";
pub const MODEL_FILE: &str = "model.json";
pub const RESULTS_FILE: &str = "model_results.json";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("Feature engineering failed: {0}")]
    Engineering(#[from] EngineeringError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error("Training failed: {0}")]
    Model(String),
    #[error("Failed to write {path}: {reason}")]
    Output { path: PathBuf, reason: String },
}

/// Which stages to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    Prepare,
    Engineer,
    Train,
    #[default]
    All,
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "prepare" => Ok(Stage::Prepare),
            "engineer" => Ok(Stage::Engineer),
            "train" => Ok(Stage::Train),
            "all" => Ok(Stage::All),
            other => Err(format!("Unknown stage: {other}")),
        }
    }
}

/// Hyperparameters, learning curve and test scores of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResults {
    pub learning_rate: f32,
    pub n_estimators: usize,
    pub bins: usize,
    pub train_rows: usize,
    pub val_rows: usize,
    pub test_rows: usize,
    pub training_log: TrainingLog,
    pub test: Evaluation,
    /// `(feature, share of stumps)`, most used first.
    pub feature_importance: Vec<(String, f64)>,
}

pub fn run(config: &Config, stage: Stage) -> Result<(), PipelineError> {
    config.validate()?;
    if matches!(stage, Stage::Prepare | Stage::All) {
        prepare_data(config)?;
    }
    if matches!(stage, Stage::Engineer | Stage::All) {
        engineer_data(config)?;
    }
    if matches!(stage, Stage::Train | Stage::All) {
        run_modelling(config)?;
    }
    Ok(())
}

/// Analyze every recording and write `features_data.csv`.
pub fn prepare_data(config: &Config) -> Result<Assembly, PipelineError> {
    let audio_dir = config.paths.audio_dir();
    let metadata = SpeakerMetadata::load(&config.paths.meta_file())?;
    let corpus = WavCorpus::open(&audio_dir)?;
    tracing::info!(
        "Preparing features for {} recordings from {} speakers in {}",
        corpus.len(),
        corpus.folder_count(),
        audio_dir.display()
    );

    let assembly = assemble(corpus.iter(), &metadata, &config.assemble_options())?;
    let (female, male) = assembly.dataset.gender_counts();
    tracing::info!(
        "Dataset has {} rows and {} columns ({female} female, {male} male)",
        assembly.dataset.len(),
        crate::dataset::Dataset::columns().len()
    );
    for skipped in &assembly.skipped {
        tracing::warn!("Skipped: {}", skipped.reason);
    }
    write_dataset(&config.paths.data_dir().join(FEATURES_FILE), &assembly.dataset)?;
    Ok(assembly)
}

/// Turn `features_data.csv` into the modelling table `final_data.csv`.
pub fn engineer_data(config: &Config) -> Result<FeatureTable, PipelineError> {
    let data_dir = config.paths.data_dir();
    let dataset = read_dataset(&data_dir.join(FEATURES_FILE))?;
    tracing::info!("Loaded {} rows for feature engineering", dataset.len());
    let table = engineer(&dataset, config.engineering.correlation_threshold)?;
    write_table(&data_dir.join(FINAL_FILE), &table)?;
    Ok(table)
}

/// Split `final_data.csv`, train the classifier and evaluate it on the test rows.
///
/// Writes `model.json` and `model_results.json` to the results directory.
pub fn run_modelling(config: &Config) -> Result<ModelResults, PipelineError> {
    let table = read_table(&config.paths.data_dir().join(FINAL_FILE))?;
    if let Some(label_idx) = table.column_index(LABEL_COLUMN) {
        for (value, count) in table.value_counts(label_idx) {
            tracing::info!("Label {value}: {count} recordings");
        }
    }
    let parts = split(&table, LABEL_COLUMN, &config.split_options())?;

    let to_train = |t: &FeatureTable| {
        TrainDataset::from_table(t, LABEL_COLUMN, &GENDER_CLASSES).map_err(PipelineError::Model)
    };
    let train = to_train(&parts.train)?;
    let val = to_train(&parts.val)?;
    let test = to_train(&parts.test)?;

    for key in config.model.extra.keys() {
        tracing::warn!("Ignoring unsupported model parameter {key}");
    }
    let options = config.train_options();
    tracing::info!(
        "Training {} rounds (learning rate {}, {} bins) on {} rows",
        options.rounds,
        options.learning_rate,
        options.bins,
        train.x.len()
    );
    let val_ref = (!val.x.is_empty()).then_some(&val);
    let (model, training_log) =
        train_gbdt_stump_with_eval(&train, val_ref, &options).map_err(PipelineError::Model)?;
    let evaluation = evaluate(&model, &test);
    tracing::info!(
        "Test accuracy: {:.2}% on {} rows",
        evaluation.accuracy * 100.0,
        test.x.len()
    );

    let mut feature_importance = model.feature_importance();
    feature_importance.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (name, share) in &feature_importance {
        tracing::info!("Feature importance {name}: {share:.3}");
    }

    let results = ModelResults {
        learning_rate: options.learning_rate,
        n_estimators: options.rounds,
        bins: options.bins,
        train_rows: train.x.len(),
        val_rows: val.x.len(),
        test_rows: test.x.len(),
        training_log,
        test: evaluation,
        feature_importance,
    };
    let results_dir = config.paths.results_dir();
    let model_path = results_dir.join(MODEL_FILE);
    model.save_json(&model_path).map_err(|reason| PipelineError::Output {
        path: model_path.clone(),
        reason,
    })?;
    write_results(&results_dir.join(RESULTS_FILE), &results)?;
    tracing::info!("Saved model to {}", model_path.display());
    Ok(results)
}

fn write_results(path: &Path, results: &ModelResults) -> Result<(), PipelineError> {
    let output_error = |reason: String| PipelineError::Output {
        path: path.to_path_buf(),
        reason,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| output_error(err.to_string()))?;
    }
    let bytes = serde_json::to_vec_pretty(results).map_err(|err| output_error(err.to_string()))?;
    std::fs::write(path, bytes).map_err(|err| output_error(err.to_string()))
}
