//! Seeded train/validation/test partitioning of a feature table.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::FeatureTable;

/// How rows are distributed across the three partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Shuffle all rows together.
    #[default]
    Random,
    /// Shuffle and cut each label value separately so every partition keeps
    /// the label proportions.
    Stratified,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    pub test_ratio: f64,
    pub val_ratio: f64,
    pub seed: u64,
    pub mode: SplitMode,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_ratio: 0.1,
            val_ratio: 0.1,
            seed: 42,
            mode: SplitMode::Random,
        }
    }
}

impl SplitOptions {
    pub fn validate(&self) -> Result<(), SplitError> {
        let in_range = |r: f64| r > 0.0 && r < 1.0;
        if !in_range(self.test_ratio)
            || !in_range(self.val_ratio)
            || self.test_ratio + self.val_ratio >= 1.0
        {
            return Err(SplitError::InvalidRatio {
                test_ratio: self.test_ratio,
                val_ratio: self.val_ratio,
            });
        }
        Ok(())
    }
}

/// The three partitions; together they hold every input row exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitTables {
    pub train: FeatureTable,
    pub val: FeatureTable,
    pub test: FeatureTable,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplitError {
    #[error("Split ratios must be in (0, 1) and sum below 1 (test={test_ratio}, val={val_ratio})")]
    InvalidRatio { test_ratio: f64, val_ratio: f64 },
    #[error("Label column {0:?} not found")]
    MissingLabelColumn(String),
}

/// Partition `table` into train, validation and test rows.
///
/// The test partition gets `round(test_ratio * n)` rows and the validation
/// partition `round(val_ratio * n)` of the shuffled order; training keeps the
/// rest. The same seed always produces the same partitions.
pub fn split(
    table: &FeatureTable,
    label_column: &str,
    options: &SplitOptions,
) -> Result<SplitTables, SplitError> {
    options.validate()?;
    let label_idx = table
        .column_index(label_column)
        .ok_or_else(|| SplitError::MissingLabelColumn(label_column.to_string()))?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let groups: Vec<Vec<usize>> = match options.mode {
        SplitMode::Random => vec![(0..table.len()).collect()],
        SplitMode::Stratified => group_by_label(table, label_idx),
    };

    let mut train = Vec::new();
    let mut val = Vec::new();
    let mut test = Vec::new();
    for mut indices in groups {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let test_count = partition_size(n, options.test_ratio);
        let val_count = partition_size(n, options.val_ratio).min(n - test_count);
        test.extend_from_slice(&indices[..test_count]);
        val.extend_from_slice(&indices[test_count..test_count + val_count]);
        train.extend_from_slice(&indices[test_count + val_count..]);
    }

    tracing::info!(
        "Split {} rows into train={} val={} test={} ({:?}, seed {})",
        table.len(),
        train.len(),
        val.len(),
        test.len(),
        options.mode,
        options.seed
    );
    Ok(SplitTables {
        train: table.select_rows(&train),
        val: table.select_rows(&val),
        test: table.select_rows(&test),
    })
}

fn partition_size(n: usize, ratio: f64) -> usize {
    ((n as f64 * ratio).round() as usize).min(n)
}

/// Row indices per distinct label value, ascending by value.
fn group_by_label(table: &FeatureTable, label_idx: usize) -> Vec<Vec<usize>> {
    let labels = table.column(label_idx);
    table
        .value_counts(label_idx)
        .into_iter()
        .map(|(value, _)| {
            labels
                .iter()
                .enumerate()
                .filter(|(_, label)| **label == value)
                .map(|(idx, _)| idx)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> FeatureTable {
        let rows = (0..n)
            .map(|i| vec![i as f64, (i % 4 == 0) as u8 as f64])
            .collect();
        FeatureTable::new(vec!["id".into(), "label".into()], rows).unwrap()
    }

    fn ids(t: &FeatureTable) -> Vec<usize> {
        t.column(0).into_iter().map(|v| v as usize).collect()
    }

    #[test]
    fn ten_rows_split_eight_one_one() {
        let parts = split(&table(10), "label", &SplitOptions::default()).unwrap();
        assert_eq!(parts.train.len(), 8);
        assert_eq!(parts.val.len(), 1);
        assert_eq!(parts.test.len(), 1);
    }

    #[test]
    fn partitions_are_disjoint_and_cover_all_rows() {
        let parts = split(&table(100), "label", &SplitOptions::default()).unwrap();
        let mut all: Vec<usize> = ids(&parts.train)
            .into_iter()
            .chain(ids(&parts.val))
            .chain(ids(&parts.test))
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
        assert_eq!(parts.test.len(), 10);
        assert_eq!(parts.val.len(), 10);
    }

    #[test]
    fn same_seed_gives_same_partitions() {
        let options = SplitOptions::default();
        let a = split(&table(100), "label", &options).unwrap();
        let b = split(&table(100), "label", &options).unwrap();
        assert_eq!(a, b);

        let other = SplitOptions { seed: 7, ..options };
        let c = split(&table(100), "label", &other).unwrap();
        assert_ne!(ids(&a.test), ids(&c.test));
    }

    #[test]
    fn stratified_split_keeps_label_proportions() {
        let options = SplitOptions {
            mode: SplitMode::Stratified,
            ..SplitOptions::default()
        };
        let parts = split(&table(100), "label", &options).unwrap();
        let label_idx = 1;
        // 25 positives and 75 negatives: 2.5 rounds to 3 (half away from zero), 7.5 to 8.
        assert_eq!(parts.test.value_counts(label_idx), vec![(0.0, 8), (1.0, 3)]);
        assert_eq!(parts.val.value_counts(label_idx), vec![(0.0, 8), (1.0, 3)]);
        assert_eq!(parts.train.len(), 100 - 22);
    }

    #[test]
    fn rejects_invalid_ratios() {
        for (test_ratio, val_ratio) in [(-0.1, 0.1), (0.6, 0.4), (f64::NAN, 0.1), (0.0, 0.1), (0.1, 1.0)] {
            let options = SplitOptions {
                test_ratio,
                val_ratio,
                ..SplitOptions::default()
            };
            assert!(matches!(
                split(&table(10), "label", &options),
                Err(SplitError::InvalidRatio { .. })
            ));
        }
    }

    #[test]
    fn requires_label_column() {
        let err = split(&table(10), "gender", &SplitOptions::default()).unwrap_err();
        assert_eq!(err, SplitError::MissingLabelColumn("gender".into()));
    }

    #[test]
    fn tiny_tables_can_leave_partitions_empty() {
        let parts = split(&table(4), "label", &SplitOptions::default()).unwrap();
        // round(0.4) = 0 rows for test and val.
        assert_eq!(parts.train.len(), 4);
        assert!(parts.val.is_empty() && parts.test.is_empty());
    }
}
