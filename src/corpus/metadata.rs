use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CorpusError;

/// Binary speaker gender label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }

    /// Numeric training label: female 0, male 1.
    pub fn label(self) -> u8 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" => Ok(Gender::Female),
            "male" => Ok(Gender::Male),
            other => Err(other.to_string()),
        }
    }
}

/// Metadata record for one speaker.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeakerInfo {
    pub gender: String,
    /// Remaining fields (age, accent, ...) kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Speaker id to metadata lookup.
#[derive(Debug, Clone, Default)]
pub struct SpeakerMetadata {
    speakers: BTreeMap<String, SpeakerInfo>,
}

impl SpeakerMetadata {
    /// Load a JSON object keyed by speaker id.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let bytes = std::fs::read(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&bytes).map_err(|source| CorpusError::Metadata {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let speakers: BTreeMap<String, SpeakerInfo> = serde_json::from_slice(bytes)?;
        Ok(Self { speakers })
    }

    pub fn insert(&mut self, speaker_id: impl Into<String>, gender: Gender) {
        self.speakers.insert(
            speaker_id.into(),
            SpeakerInfo {
                gender: gender.as_str().to_string(),
                extra: BTreeMap::new(),
            },
        );
    }

    pub fn get(&self, speaker_id: &str) -> Option<&SpeakerInfo> {
        self.speakers.get(speaker_id)
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// Resolve the gender label for a speaker.
    pub fn gender_of(&self, speaker_id: &str) -> Result<Gender, CorpusError> {
        let info = self
            .speakers
            .get(speaker_id)
            .ok_or_else(|| CorpusError::UnknownSpeaker {
                speaker_id: speaker_id.to_string(),
            })?;
        info.gender
            .parse()
            .map_err(|value| CorpusError::UnknownGender {
                speaker_id: speaker_id.to_string(),
                value,
            })
    }
}
