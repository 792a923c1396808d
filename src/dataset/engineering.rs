//! Prepare the assembled dataset for modelling.

use thiserror::Error;

use super::{Dataset, FeatureTable};
use crate::analysis::FEATURE_KEYS;

/// Numeric class column appended by [`engineer`]: female 0, male 1.
pub const LABEL_COLUMN: &str = "label";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineeringError {
    #[error("Column {0:?} not found")]
    MissingColumn(String),
    #[error("Dataset has no rows")]
    EmptyTable,
    #[error("Malformed table: {0}")]
    Shape(String),
}

/// Build the modelling table from the assembled dataset.
///
/// Drops `digit`, encodes gender into a trailing [`LABEL_COLUMN`], removes
/// constant feature columns and then every column whose absolute Pearson
/// correlation with an earlier kept column exceeds `threshold`.
pub fn engineer(dataset: &Dataset, threshold: f64) -> Result<FeatureTable, EngineeringError> {
    if dataset.is_empty() {
        return Err(EngineeringError::EmptyTable);
    }
    let columns: Vec<String> = FEATURE_KEYS
        .iter()
        .map(|key| key.to_string())
        .chain([LABEL_COLUMN.to_string()])
        .collect();
    let rows = dataset
        .rows()
        .iter()
        .map(|row| {
            let mut values = row.features.values().to_vec();
            values.push(f64::from(row.gender.label()));
            values
        })
        .collect();
    let table = build_table(columns, rows)?;

    let table = remove_constant_columns(&table);
    let table = remove_correlated_columns(&table, threshold)?;
    tracing::info!(
        "Engineered table keeps {} feature columns: {:?}",
        table.columns().len() - 1,
        &table.columns()[..table.columns().len() - 1]
    );
    Ok(table)
}

fn remove_constant_columns(table: &FeatureTable) -> FeatureTable {
    let keep: Vec<usize> = (0..table.columns().len())
        .filter(|&idx| {
            let name = &table.columns()[idx];
            if name == LABEL_COLUMN {
                return true;
            }
            let column = table.column(idx);
            let constant = column.windows(2).all(|pair| pair[0] == pair[1]);
            if constant {
                tracing::info!("Dropping constant column {name}");
            }
            !constant
        })
        .collect();
    table.select_columns(&keep)
}

fn remove_correlated_columns(
    table: &FeatureTable,
    threshold: f64,
) -> Result<FeatureTable, EngineeringError> {
    let corr = pearson_correlation(table, &[LABEL_COLUMN])?;
    let features = corr.columns();
    let mut kept: Vec<usize> = Vec::new();
    for i in 0..features.len() {
        let redundant = kept.iter().find(|&&j| corr.rows()[i][j].abs() > threshold);
        match redundant {
            Some(&j) => tracing::info!(
                "Dropping {} (|r| = {:.3} with {})",
                features[i],
                corr.rows()[i][j].abs(),
                features[j]
            ),
            None => kept.push(i),
        }
    }

    let mut indices: Vec<usize> = Vec::with_capacity(kept.len() + 1);
    for &i in &kept {
        indices.extend(table.column_index(&features[i]));
    }
    let label = table
        .column_index(LABEL_COLUMN)
        .ok_or_else(|| EngineeringError::MissingColumn(LABEL_COLUMN.to_string()))?;
    indices.push(label);
    Ok(table.select_columns(&indices))
}

/// Pearson correlation matrix of every column not named in `exclude`.
///
/// The result is square: its columns are the correlated column names and row
/// `i` holds the coefficients of column `i`. Pairs involving a zero-variance
/// column are reported as 0.
pub fn pearson_correlation(
    table: &FeatureTable,
    exclude: &[&str],
) -> Result<FeatureTable, EngineeringError> {
    for name in exclude {
        if table.column_index(name).is_none() {
            return Err(EngineeringError::MissingColumn(name.to_string()));
        }
    }
    if table.is_empty() {
        return Err(EngineeringError::EmptyTable);
    }
    let selected: Vec<usize> = (0..table.columns().len())
        .filter(|&idx| !exclude.contains(&table.columns()[idx].as_str()))
        .collect();
    let centered: Vec<(Vec<f64>, f64)> = selected
        .iter()
        .map(|&idx| {
            let column = table.column(idx);
            let mean = column.iter().sum::<f64>() / column.len() as f64;
            let deviations: Vec<f64> = column.iter().map(|v| v - mean).collect();
            let norm = deviations.iter().map(|d| d * d).sum::<f64>().sqrt();
            (deviations, norm)
        })
        .collect();

    let matrix = centered
        .iter()
        .map(|(a, norm_a)| {
            centered
                .iter()
                .map(|(b, norm_b)| {
                    let r = a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>() / (norm_a * norm_b);
                    if r.is_finite() { r.clamp(-1.0, 1.0) } else { 0.0 }
                })
                .collect()
        })
        .collect();
    let names = selected
        .iter()
        .map(|&idx| table.columns()[idx].clone())
        .collect();
    build_table(names, matrix)
}

fn build_table(
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
) -> Result<FeatureTable, EngineeringError> {
    FeatureTable::new(columns, rows).map_err(EngineeringError::Shape)
}
