//! Dataset construction, persistence, feature engineering and splitting.

pub mod assemble;
pub mod engineering;
pub mod persist;
pub mod split;
pub mod table;

pub use assemble::{AssembleError, AssembleOptions, Assembly, FailurePolicy, SkippedRecording, assemble};
pub use engineering::{EngineeringError, LABEL_COLUMN, engineer, pearson_correlation};
pub use persist::{PersistError, read_dataset, read_table, write_dataset, write_table};
pub use split::{SplitError, SplitMode, SplitOptions, SplitTables, split};
pub use table::FeatureTable;

use crate::analysis::{FEATURE_KEYS, SpectralFeatures};
use crate::corpus::Gender;

/// Column holding the speaker gender in the assembled dataset.
pub const GENDER_COLUMN: &str = "gender";
/// Column holding the spoken digit in the assembled dataset.
pub const DIGIT_COLUMN: &str = "digit";

/// One recording's normalized features with its labels attached.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub features: SpectralFeatures,
    pub gender: Gender,
    pub digit: u8,
}

/// Labeled rows in corpus traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<LabeledRow>,
}

impl Dataset {
    pub fn new(rows: Vec<LabeledRow>) -> Self {
        Self { rows }
    }

    /// Header of the persisted table: feature keys, then `gender`, `digit`.
    pub fn columns() -> Vec<&'static str> {
        FEATURE_KEYS
            .iter()
            .copied()
            .chain([GENDER_COLUMN, DIGIT_COLUMN])
            .collect()
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row count per gender, female first.
    pub fn gender_counts(&self) -> (usize, usize) {
        let female = self
            .rows
            .iter()
            .filter(|row| row.gender == Gender::Female)
            .count();
        (female, self.rows.len() - female)
    }
}
