use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};

use super::{AudioClip, CorpusError, CorpusItem};

/// One WAV file found under the corpus root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub path: PathBuf,
    /// Name of the speaker folder containing the file.
    pub folder: String,
}

/// A corpus laid out as `<root>/<speaker>/<digit>_<speaker>_<repetition>.wav`.
///
/// Folders and files are visited in lexicographic order so the traversal is
/// reproducible across runs and platforms.
#[derive(Debug, Clone)]
pub struct WavCorpus {
    root: PathBuf,
    entries: Vec<CorpusEntry>,
}

impl WavCorpus {
    /// Enumerate every `.wav` file under `root`, one folder level deep.
    pub fn open(root: &Path) -> Result<Self, CorpusError> {
        let mut folders = list_dir(root)?
            .into_iter()
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        folders.sort();

        let mut entries = Vec::new();
        for folder in folders {
            let folder_name = folder
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string();
            let mut files = list_dir(&folder)?
                .into_iter()
                .filter(|path| path.is_file() && is_wav(path))
                .collect::<Vec<_>>();
            files.sort();
            entries.extend(files.into_iter().map(|path| CorpusEntry {
                path,
                folder: folder_name.clone(),
            }));
        }
        tracing::debug!(
            "Found {} recordings under {}",
            entries.len(),
            root.display()
        );
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct speaker folders holding at least one recording.
    pub fn folder_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&str> = None;
        for entry in &self.entries {
            if last != Some(entry.folder.as_str()) {
                count += 1;
                last = Some(entry.folder.as_str());
            }
        }
        count
    }

    /// Lazily decode each recording in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = Result<CorpusItem, CorpusError>> + '_ {
        self.entries.iter().map(load_entry)
    }
}

fn load_entry(entry: &CorpusEntry) -> Result<CorpusItem, CorpusError> {
    let (digit, speaker_id, repetition) = parse_file_name(&entry.path)?;
    let clip = read_wav(&entry.path)?;
    Ok(CorpusItem {
        path: entry.path.clone(),
        clip,
        digit,
        speaker_id,
        repetition,
    })
}

/// Split `<digit>_<speaker>_<repetition>.wav` into its labels.
pub fn parse_file_name(path: &Path) -> Result<(u8, String, u32), CorpusError> {
    let format_error = |reason: String| CorpusError::Format {
        path: path.to_path_buf(),
        reason,
    };
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| format_error("file name is not valid UTF-8".to_string()))?;
    let parts: Vec<&str> = stem.split('_').collect();
    let [digit, speaker, repetition] = parts.as_slice() else {
        return Err(format_error(format!(
            "expected <digit>_<speaker>_<repetition>, got {stem:?}"
        )));
    };
    let digit = digit
        .parse::<u8>()
        .ok()
        .filter(|d| *d <= 9)
        .ok_or_else(|| format_error(format!("invalid digit {digit:?}")))?;
    if speaker.is_empty() {
        return Err(format_error("empty speaker id".to_string()));
    }
    let repetition = repetition
        .parse::<u32>()
        .map_err(|_| format_error(format!("invalid repetition {repetition:?}")))?;
    Ok((digit, speaker.to_string(), repetition))
}

/// Decode a WAV file into mono `f32` samples at the file's native rate.
///
/// Integer PCM keeps its raw magnitude (an `i16` sample of 1000 becomes
/// `1000.0`); multi-channel files are averaged down to mono.
pub fn read_wav(path: &Path) -> Result<AudioClip, CorpusError> {
    let wav_error = |source: hound::Error| CorpusError::Wav {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => reader
            .samples::<i32>()
            .map(|sample| sample.map(|v| v as f32))
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
    };
    if spec.sample_rate == 0 {
        return Err(CorpusError::Format {
            path: path.to_path_buf(),
            reason: "sample rate is zero".to_string(),
        });
    }
    let samples = downmix_to_mono(&interleaved, spec.channels);
    if samples.is_empty() {
        return Err(CorpusError::Format {
            path: path.to_path_buf(),
            reason: "recording has no samples".to_string(),
        });
    }
    Ok(AudioClip {
        sample_rate: spec.sample_rate,
        samples,
    })
}

fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    let io_error = |source: std::io::Error| CorpusError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        out.push(entry.map_err(io_error)?.path());
    }
    Ok(out)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}
