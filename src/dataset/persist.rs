//! CSV persistence for the assembled dataset and feature tables.
//!
//! Floats are written in Rust's shortest round-trip form, so a write/read cycle
//! reproduces every value bit for bit and keeps the row order.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord, Writer};
use thiserror::Error;

use super::{Dataset, FeatureTable, LabeledRow};
use crate::analysis::{FEATURE_COUNT, SpectralFeatures};
use crate::corpus::Gender;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("csv error at {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("unexpected header in {path}: expected {expected:?}, found {found:?}")]
    Header {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("row at {path}:{line} has {found} fields, expected {expected}")]
    RowLength {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("malformed table in {path}: {reason}")]
    Table { path: PathBuf, reason: String },
    #[error("invalid value {value:?} in column {column} at {path}:{line}")]
    Value {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
}

/// Write the assembled dataset with header `<features..>,gender,digit`.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), PersistError> {
    let mut writer = open_writer(path)?;
    let csv_error = |source| PersistError::Csv {
        path: path.to_path_buf(),
        source,
    };
    writer
        .write_record(Dataset::columns())
        .map_err(csv_error)?;
    for row in dataset.rows() {
        let mut record: Vec<String> = row.features.values().iter().map(f64::to_string).collect();
        record.push(row.gender.as_str().to_string());
        record.push(row.digit.to_string());
        writer.write_record(&record).map_err(csv_error)?;
    }
    flush(writer, path)?;
    tracing::info!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}

/// Read a dataset written by [`write_dataset`].
pub fn read_dataset(path: &Path) -> Result<Dataset, PersistError> {
    let mut reader = open_reader(path)?;
    let expected: Vec<String> = Dataset::columns().into_iter().map(String::from).collect();
    check_header(&mut reader, path, &expected)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| PersistError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        check_row_length(&record, expected.len(), path)?;
        let mut values = [0.0_f64; FEATURE_COUNT];
        for (idx, slot) in values.iter_mut().enumerate() {
            *slot = parse_field(&record, idx, &expected, path)?;
        }
        let gender = field(&record, FEATURE_COUNT)
            .parse::<Gender>()
            .map_err(|_| value_error(&record, FEATURE_COUNT, &expected, path))?;
        let digit = field(&record, FEATURE_COUNT + 1)
            .parse::<u8>()
            .map_err(|_| value_error(&record, FEATURE_COUNT + 1, &expected, path))?;
        rows.push(LabeledRow {
            features: SpectralFeatures::from_values(values),
            gender,
            digit,
        });
    }
    Ok(Dataset::new(rows))
}

/// Write a numeric table with its column names as header.
pub fn write_table(path: &Path, table: &FeatureTable) -> Result<(), PersistError> {
    let mut writer = open_writer(path)?;
    let csv_error = |source| PersistError::Csv {
        path: path.to_path_buf(),
        source,
    };
    writer.write_record(table.columns()).map_err(csv_error)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(f64::to_string))
            .map_err(csv_error)?;
    }
    flush(writer, path)?;
    tracing::info!(
        "Wrote {} rows x {} columns to {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(())
}

/// Read a numeric table written by [`write_table`].
pub fn read_table(path: &Path) -> Result<FeatureTable, PersistError> {
    let mut reader = open_reader(path)?;
    let columns: Vec<String> = reader
        .headers()
        .map_err(|source| PersistError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(String::from)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| PersistError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        check_row_length(&record, columns.len(), path)?;
        let row = (0..columns.len())
            .map(|idx| parse_field(&record, idx, &columns, path))
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }
    build_table(columns, rows, path)
}

fn build_table(
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    path: &Path,
) -> Result<FeatureTable, PersistError> {
    FeatureTable::new(columns, rows).map_err(|reason| PersistError::Table {
        path: path.to_path_buf(),
        reason,
    })
}

fn open_writer(path: &Path) -> Result<Writer<std::fs::File>, PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|source| PersistError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Writer::from_path(path).map_err(|source| PersistError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn open_reader(path: &Path) -> Result<Reader<std::fs::File>, PersistError> {
    // Ragged rows are reported as RowLength with their line instead of a bare csv error.
    ReaderBuilder::new().flexible(true).from_path(path).map_err(|source| PersistError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn flush(mut writer: Writer<std::fs::File>, path: &Path) -> Result<(), PersistError> {
    writer.flush().map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn check_header(
    reader: &mut Reader<std::fs::File>,
    path: &Path,
    expected: &[String],
) -> Result<(), PersistError> {
    let found: Vec<String> = reader
        .headers()
        .map_err(|source| PersistError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(String::from)
        .collect();
    if found != expected {
        return Err(PersistError::Header {
            path: path.to_path_buf(),
            expected: expected.to_vec(),
            found,
        });
    }
    Ok(())
}

fn check_row_length(
    record: &StringRecord,
    expected: usize,
    path: &Path,
) -> Result<(), PersistError> {
    if record.len() != expected {
        return Err(PersistError::RowLength {
            path: path.to_path_buf(),
            line: record.position().map(|p| p.line()).unwrap_or(0),
            expected,
            found: record.len(),
        });
    }
    Ok(())
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

fn parse_field(
    record: &StringRecord,
    idx: usize,
    columns: &[String],
    path: &Path,
) -> Result<f64, PersistError> {
    field(record, idx)
        .trim()
        .parse::<f64>()
        .map_err(|_| value_error(record, idx, columns, path))
}

fn value_error(record: &StringRecord, idx: usize, columns: &[String], path: &Path) -> PersistError {
    PersistError::Value {
        path: path.to_path_buf(),
        line: record.position().map(|p| p.line()).unwrap_or(0),
        column: columns.get(idx).cloned().unwrap_or_default(),
        value: field(record, idx).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            LabeledRow {
                features: SpectralFeatures::from_values([
                    0.1, 0.0, 1.0 / 3.0, 1.0, 0.123_456_789_012_345_67, 0.5, 0.75, 2e-17, 0.9,
                ]),
                gender: Gender::Male,
                digit: 4,
            },
            LabeledRow {
                features: SpectralFeatures::from_values([
                    1.0, 0.2, 0.3, 0.0, 0.4, 0.5, 0.6, 0.7, 0.8,
                ]),
                gender: Gender::Female,
                digit: 0,
            },
        ])
    }

    #[test]
    fn dataset_round_trip_is_lossless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("features_data.csv");
        let original = dataset();
        write_dataset(&path, &original).unwrap();
        let loaded = read_dataset(&path).unwrap();
        assert_eq!(loaded, original);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "mean,std,median,max,min,skewness,kurtosis,dfrange,modindx,gender,digit\n"
        ));
    }

    #[test]
    fn rejects_unexpected_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(read_dataset(&path), Err(PersistError::Header { .. })));
    }

    #[test]
    fn reports_bad_values_with_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        let header = Dataset::columns().join(",");
        std::fs::write(&path, format!("{header}\n0,0,0,0,0,0,0,0,0,other,1\n")).unwrap();
        match read_dataset(&path) {
            Err(PersistError::Value { column, value, .. }) => {
                assert_eq!(column, "gender");
                assert_eq!(value, "other");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn reports_ragged_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b,label\n1,2,0\n3,1\n").unwrap();
        match read_table(&path) {
            Err(PersistError::RowLength {
                line,
                expected,
                found,
                ..
            }) => assert_eq!((line, expected, found), (3, 3, 2)),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn table_shape_errors_are_reported() {
        let err = build_table(
            vec!["a".into(), "label".into()],
            vec![vec![1.0]],
            Path::new("final_data.csv"),
        )
        .unwrap_err();
        match err {
            PersistError::Table { path, reason } => {
                assert_eq!(path, PathBuf::from("final_data.csv"));
                assert!(reason.contains("Row 0"), "{reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn table_round_trip_keeps_columns_and_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("final_data.csv");
        let table = FeatureTable::new(
            vec!["std".into(), "modindx".into(), "label".into()],
            vec![vec![0.25, -1.5e-8, 1.0], vec![0.1 + 0.2, 3.0, 0.0]],
        )
        .unwrap();
        write_table(&path, &table).unwrap();
        assert_eq!(read_table(&path).unwrap(), table);
    }
}
