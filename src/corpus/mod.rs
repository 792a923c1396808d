//! Spoken-digit corpus access: WAV enumeration/decoding and speaker metadata.

mod metadata;
mod reader;

pub use metadata::{Gender, SpeakerInfo, SpeakerMetadata};
pub use reader::{CorpusEntry, WavCorpus, parse_file_name, read_wav};

use std::path::PathBuf;

use thiserror::Error;

/// Raw recording as read from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Source-native sample rate in Hz.
    pub sample_rate: u32,
    /// Mono samples (raw PCM values, not rescaled).
    pub samples: Vec<f32>,
}

/// A decoded recording with the labels carried by its file name.
#[derive(Debug, Clone)]
pub struct CorpusItem {
    pub path: PathBuf,
    pub clip: AudioClip,
    /// Spoken digit, `0..=9`.
    pub digit: u8,
    pub speaker_id: String,
    pub repetition: u32,
}

/// Errors raised while reading the corpus or its metadata.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode WAV {path}: {source}")]
    Wav { path: PathBuf, source: hound::Error },
    /// File name or contents do not follow the corpus layout.
    #[error("Malformed corpus entry {path}: {reason}")]
    Format { path: PathBuf, reason: String },
    /// Speaker id missing from the metadata lookup.
    #[error("No metadata for speaker {speaker_id}")]
    UnknownSpeaker { speaker_id: String },
    #[error("Unrecognized gender {value:?} for speaker {speaker_id}")]
    UnknownGender { speaker_id: String, value: String },
    #[error("Invalid speaker metadata at {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl CorpusError {
    /// Whether the error concerns one recording's layout or labels rather than I/O.
    pub fn is_per_recording(&self) -> bool {
        matches!(
            self,
            CorpusError::Format { .. }
                | CorpusError::UnknownSpeaker { .. }
                | CorpusError::UnknownGender { .. }
        )
    }
}
