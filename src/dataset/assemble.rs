//! Turn a labeled corpus into a [`Dataset`], one row per recording.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Dataset, LabeledRow};
use crate::analysis::{AnalysisError, SignalOptions, analyze_clip};
use crate::corpus::{CorpusError, CorpusItem, SpeakerMetadata};

/// What to do when a single recording cannot be turned into a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run on the first failing recording.
    #[default]
    Abort,
    /// Log the failure, record it and continue with the next recording.
    Skip,
}

/// Configuration for [`assemble`].
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    pub signal: SignalOptions,
    pub on_error: FailurePolicy,
    /// Seed for the random placement of short signals inside the frame.
    pub pad_seed: u64,
}

/// A recording left out of the dataset under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecording {
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// Result of an assembly run.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub dataset: Dataset,
    pub skipped: Vec<SkippedRecording>,
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error("Analysis failed for {path}: {source}")]
    Analysis {
        path: PathBuf,
        source: AnalysisError,
    },
    #[error("No label for {path}: {source}")]
    Label { path: PathBuf, source: CorpusError },
}

impl AssembleError {
    /// Whether the failure is confined to one recording (and may be skipped).
    pub fn is_per_recording(&self) -> bool {
        match self {
            AssembleError::Corpus(err) => err.is_per_recording(),
            AssembleError::Analysis { .. } => true,
            AssembleError::Label { source, .. } => source.is_per_recording(),
        }
    }
}

/// Run every corpus item through the analysis chain and collect labeled rows.
///
/// Rows keep the order in which `items` yields them. I/O and decoding errors
/// always abort; per-recording failures follow `options.on_error`.
pub fn assemble<I>(
    items: I,
    metadata: &SpeakerMetadata,
    options: &AssembleOptions,
) -> Result<Assembly, AssembleError>
where
    I: IntoIterator<Item = Result<CorpusItem, CorpusError>>,
{
    let mut rng = StdRng::seed_from_u64(options.pad_seed);
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    let mut current_speaker: Option<String> = None;

    for item in items {
        let outcome = match item {
            Ok(item) => {
                if current_speaker.as_deref() != Some(item.speaker_id.as_str()) {
                    tracing::info!(
                        "Assembling speaker {} ({} rows so far)",
                        item.speaker_id,
                        rows.len()
                    );
                    current_speaker = Some(item.speaker_id.clone());
                }
                build_row(&item, metadata, options, &mut rng)
            }
            Err(err) => Err(AssembleError::from(err)),
        };
        match outcome {
            Ok(row) => rows.push(row),
            Err(err) if options.on_error == FailurePolicy::Skip && err.is_per_recording() => {
                tracing::warn!("Skipping recording: {err}");
                skipped.push(SkippedRecording {
                    path: failure_path(&err),
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        "Assembled {} rows ({} skipped)",
        rows.len(),
        skipped.len()
    );
    Ok(Assembly {
        dataset: Dataset::new(rows),
        skipped,
    })
}

fn build_row(
    item: &CorpusItem,
    metadata: &SpeakerMetadata,
    options: &AssembleOptions,
    rng: &mut StdRng,
) -> Result<LabeledRow, AssembleError> {
    let features = analyze_clip(&item.clip.samples, item.clip.sample_rate, &options.signal, rng)
        .map_err(|source| AssembleError::Analysis {
            path: item.path.clone(),
            source,
        })?;
    let gender = metadata
        .gender_of(&item.speaker_id)
        .map_err(|source| AssembleError::Label {
            path: item.path.clone(),
            source,
        })?;
    Ok(LabeledRow {
        features,
        gender,
        digit: item.digit,
    })
}

fn failure_path(err: &AssembleError) -> Option<PathBuf> {
    match err {
        AssembleError::Analysis { path, .. } | AssembleError::Label { path, .. } => {
            Some(path.clone())
        }
        AssembleError::Corpus(CorpusError::Format { path, .. }) => Some(path.clone()),
        AssembleError::Corpus(_) => None,
    }
}
