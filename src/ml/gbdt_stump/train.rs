use serde::{Deserialize, Serialize};

use super::model::{GbdtStumpModel, Stump, argmax, softmax};
use crate::dataset::FeatureTable;

/// Training hyperparameters for stump boosting.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of boosting rounds.
    pub rounds: usize,
    /// Learning rate applied per round.
    pub learning_rate: f32,
    /// Number of bins used for split search.
    pub bins: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.1,
            bins: 32,
        }
    }
}

/// In-memory dataset used for training and evaluation.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    pub feature_names: Vec<String>,
    /// Ordered list of class names.
    pub classes: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

impl TrainDataset {
    /// Split a table into features and class indices taken from `label_column`.
    ///
    /// Label values must be whole numbers indexing into `classes`.
    pub fn from_table(
        table: &FeatureTable,
        label_column: &str,
        classes: &[&str],
    ) -> Result<Self, String> {
        let label_idx = table
            .column_index(label_column)
            .ok_or_else(|| format!("Label column {label_column:?} not found"))?;
        let feature_idx: Vec<usize> = (0..table.columns().len())
            .filter(|&idx| idx != label_idx)
            .collect();
        let mut x = Vec::with_capacity(table.len());
        let mut y = Vec::with_capacity(table.len());
        for (row_idx, row) in table.rows().iter().enumerate() {
            let label = row[label_idx];
            if label.fract() != 0.0 || label < 0.0 || label as usize >= classes.len() {
                return Err(format!("Row {row_idx} has invalid label {label}"));
            }
            y.push(label as usize);
            x.push(feature_idx.iter().map(|&idx| row[idx] as f32).collect());
        }
        Ok(Self {
            feature_names: feature_idx
                .iter()
                .map(|&idx| table.columns()[idx].clone())
                .collect(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            x,
            y,
        })
    }

    pub fn feature_len(&self) -> usize {
        self.feature_names.len()
    }
}

/// Scores recorded after one boosting round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundMetrics {
    /// 1-based round number.
    pub round: usize,
    pub train_logloss: f64,
    pub train_accuracy: f64,
    pub val_logloss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

/// Per-round learning curve of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    pub rounds: Vec<RoundMetrics>,
}

impl TrainingLog {
    pub fn last(&self) -> Option<&RoundMetrics> {
        self.rounds.last()
    }
}

/// Train a stump-GBDT model using softmax gradient boosting.
pub fn train_gbdt_stump(
    dataset: &TrainDataset,
    options: &TrainOptions,
) -> Result<GbdtStumpModel, String> {
    train_gbdt_stump_with_eval(dataset, None, options).map(|(model, _)| model)
}

/// Train like [`train_gbdt_stump`], scoring train (and `val`, when given)
/// log-loss and accuracy after every round.
pub fn train_gbdt_stump_with_eval(
    dataset: &TrainDataset,
    val: Option<&TrainDataset>,
    options: &TrainOptions,
) -> Result<(GbdtStumpModel, TrainingLog), String> {
    check_dataset(dataset)?;
    if let Some(val) = val {
        if val.x.len() != val.y.len() {
            return Err("Mismatched validation X/Y lengths".to_string());
        }
        if val.feature_names != dataset.feature_names || val.classes != dataset.classes {
            return Err("Validation set does not match the training columns".to_string());
        }
    }
    if options.rounds == 0 {
        return Err("Need at least 1 boosting round".to_string());
    }

    let n = dataset.x.len();
    let n_classes = dataset.classes.len();
    let (mins, maxs) = compute_feature_min_max(&dataset.x, dataset.feature_len());
    let binned = bin_features(&dataset.x, &mins, &maxs, options.bins);

    let init_raw: Vec<f32> = class_priors(&dataset.y, n_classes)
        .iter()
        .map(|&p| p.max(1e-6).ln())
        .collect();
    let mut raw = vec![init_raw.clone(); n];
    let mut val_raw = val.map(|v| vec![init_raw.clone(); v.x.len()]);

    let mut rounds_out: Vec<Vec<Stump>> = Vec::with_capacity(options.rounds);
    let mut log = TrainingLog::default();
    for round in 0..options.rounds {
        let probs: Vec<Vec<f32>> = raw.iter().map(|r| softmax(r)).collect();
        let residuals = compute_residuals(&dataset.y, &probs, n_classes);

        let mut stumps_for_round = Vec::with_capacity(n_classes);
        for (class_idx, class_residuals) in residuals.iter().enumerate() {
            let stump = fit_best_stump_for_class(
                &binned,
                &dataset.x,
                &mins,
                &maxs,
                options.bins,
                class_residuals,
            );
            for (row, logits) in dataset.x.iter().zip(raw.iter_mut()) {
                logits[class_idx] += options.learning_rate * stump.predict(row);
            }
            if let (Some(val), Some(val_raw)) = (val, val_raw.as_mut()) {
                for (row, logits) in val.x.iter().zip(val_raw.iter_mut()) {
                    logits[class_idx] += options.learning_rate * stump.predict(row);
                }
            }
            stumps_for_round.push(stump);
        }
        rounds_out.push(stumps_for_round);

        let (train_logloss, train_accuracy) = score(&raw, &dataset.y);
        let (val_logloss, val_accuracy) = match (val, val_raw.as_ref()) {
            (Some(val), Some(val_raw)) if !val.y.is_empty() => {
                let (loss, acc) = score(val_raw, &val.y);
                (Some(loss), Some(acc))
            }
            _ => (None, None),
        };
        tracing::debug!(
            "round {}: train logloss {train_logloss:.5} acc {train_accuracy:.4}, val logloss {val_logloss:?}",
            round + 1
        );
        log.rounds.push(RoundMetrics {
            round: round + 1,
            train_logloss,
            train_accuracy,
            val_logloss,
            val_accuracy,
        });
    }

    let model = GbdtStumpModel {
        model_version: 1,
        feature_names: dataset.feature_names.clone(),
        classes: dataset.classes.clone(),
        learning_rate: options.learning_rate,
        init_raw,
        stumps: rounds_out,
    };
    Ok((model, log))
}

fn check_dataset(dataset: &TrainDataset) -> Result<(), String> {
    if dataset.x.len() != dataset.y.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if dataset.x.is_empty() {
        return Err("Empty dataset".to_string());
    }
    if dataset.classes.len() < 2 {
        return Err("Need at least 2 classes".to_string());
    }
    if dataset.feature_len() == 0 {
        return Err("Need at least 1 feature".to_string());
    }
    if dataset.feature_len() > u16::MAX as usize {
        return Err(format!("Too many features: {}", dataset.feature_len()));
    }
    if let Some(row) = dataset.x.iter().position(|r| r.len() != dataset.feature_len()) {
        return Err(format!(
            "Row {row} has {} values, expected {}",
            dataset.x[row].len(),
            dataset.feature_len()
        ));
    }
    Ok(())
}

/// Mean log-loss and accuracy of raw logits against class indices.
fn score(raw: &[Vec<f32>], y: &[usize]) -> (f64, f64) {
    if y.is_empty() {
        return (0.0, 0.0);
    }
    let mut loss = 0.0f64;
    let mut correct = 0usize;
    for (logits, &truth) in raw.iter().zip(y) {
        let p = softmax(logits).get(truth).copied().unwrap_or(0.0) as f64;
        loss -= p.max(1e-15).ln();
        if argmax(logits) == truth {
            correct += 1;
        }
    }
    (loss / y.len() as f64, correct as f64 / y.len() as f64)
}

fn class_priors(y: &[usize], n_classes: usize) -> Vec<f32> {
    let mut counts = vec![0usize; n_classes];
    for &label in y {
        if label < n_classes {
            counts[label] += 1;
        }
    }
    let total = y.len().max(1) as f32;
    counts.into_iter().map(|c| c as f32 / total).collect()
}

fn compute_residuals(y: &[usize], probs: &[Vec<f32>], n_classes: usize) -> Vec<Vec<f32>> {
    let mut residuals = vec![vec![0.0f32; y.len()]; n_classes];
    for (i, (&yi, p)) in y.iter().zip(probs).enumerate() {
        for (k, class_residuals) in residuals.iter_mut().enumerate() {
            let target = if yi == k { 1.0 } else { 0.0 };
            class_residuals[i] = target - p[k];
        }
    }
    residuals
}

fn compute_feature_min_max(x: &[Vec<f32>], feature_len: usize) -> (Vec<f32>, Vec<f32>) {
    let mut mins = vec![f32::INFINITY; feature_len];
    let mut maxs = vec![f32::NEG_INFINITY; feature_len];
    for row in x {
        for (j, &v) in row.iter().take(feature_len).enumerate() {
            if v.is_finite() {
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
    }
    for (min, max) in mins.iter_mut().zip(maxs.iter_mut()) {
        if !min.is_finite() || !max.is_finite() {
            *min = 0.0;
            *max = 0.0;
        }
        if *min == *max {
            *max = *min + 1.0;
        }
    }
    (mins, maxs)
}

fn bin_features(x: &[Vec<f32>], mins: &[f32], maxs: &[f32], bins: usize) -> Vec<Vec<u8>> {
    let bins = bins.clamp(2, 256) as f32;
    x.iter()
        .map(|row| {
            mins.iter()
                .zip(maxs)
                .enumerate()
                .map(|(j, (&min, &max))| {
                    let v = row.get(j).copied().unwrap_or(0.0);
                    let t = ((v - min) / (max - min)).clamp(0.0, 1.0);
                    (t * (bins - 1.0)).round() as u8
                })
                .collect()
        })
        .collect()
}

fn fit_best_stump_for_class(
    binned: &[Vec<u8>],
    x: &[Vec<f32>],
    mins: &[f32],
    maxs: &[f32],
    bins: usize,
    residuals: &[f32],
) -> Stump {
    let bins = bins.clamp(2, 256);
    let mut best = BestSplit::default();
    for feature_idx in 0..mins.len() {
        let split = best_split_for_feature(binned, residuals, feature_idx, bins);
        if split.score < best.score {
            best = split;
        }
    }

    let feature_idx = best.feature_index;
    let threshold = threshold_for_bin(mins[feature_idx], maxs[feature_idx], best.split_bin, bins);
    let (left_value, right_value) = leaf_means_for_threshold(x, residuals, feature_idx, threshold);
    Stump {
        feature_index: feature_idx as u16,
        threshold,
        left_value,
        right_value,
    }
}

#[derive(Debug, Clone)]
struct BestSplit {
    score: f64,
    feature_index: usize,
    split_bin: usize,
}

impl Default for BestSplit {
    fn default() -> Self {
        Self {
            score: f64::INFINITY,
            feature_index: 0,
            split_bin: 0,
        }
    }
}

/// Lowest summed squared error over all bin boundaries of one feature.
fn best_split_for_feature(
    binned: &[Vec<u8>],
    residuals: &[f32],
    feature_idx: usize,
    bins: usize,
) -> BestSplit {
    let mut counts = vec![0u32; bins];
    let mut sums = vec![0f64; bins];
    let mut sums_sq = vec![0f64; bins];
    for (row, &r) in binned.iter().zip(residuals) {
        let b = row.get(feature_idx).copied().unwrap_or(0) as usize;
        let r = r as f64;
        counts[b] += 1;
        sums[b] += r;
        sums_sq[b] += r * r;
    }
    let total_count: u32 = counts.iter().sum();
    if total_count == 0 {
        return BestSplit::default();
    }
    let total_sum: f64 = sums.iter().sum();
    let total_sum_sq: f64 = sums_sq.iter().sum();

    let mut best = BestSplit {
        feature_index: feature_idx,
        ..BestSplit::default()
    };
    let mut left_count = 0u32;
    let mut left_sum = 0f64;
    let mut left_sum_sq = 0f64;
    for split_bin in 0..(bins - 1) {
        left_count += counts[split_bin];
        left_sum += sums[split_bin];
        left_sum_sq += sums_sq[split_bin];
        let right_count = total_count - left_count;
        if left_count == 0 || right_count == 0 {
            continue;
        }
        let right_sum = total_sum - left_sum;
        let right_sum_sq = total_sum_sq - left_sum_sq;
        let left_sse = left_sum_sq - (left_sum * left_sum) / left_count as f64;
        let right_sse = right_sum_sq - (right_sum * right_sum) / right_count as f64;
        let score = left_sse + right_sse;
        if score < best.score {
            best.score = score;
            best.split_bin = split_bin;
        }
    }
    best
}

/// Upper edge of `split_bin` in feature units.
fn threshold_for_bin(min: f32, max: f32, split_bin: usize, bins: usize) -> f32 {
    // Bin b covers values rounding to b, i.e. up to (b + 0.5) / (bins - 1).
    let t = (split_bin as f32 + 0.5) / (bins - 1) as f32;
    min + t * (max - min)
}

fn leaf_means_for_threshold(
    x: &[Vec<f32>],
    residuals: &[f32],
    feature_idx: usize,
    threshold: f32,
) -> (f32, f32) {
    let mut left = (0.0f32, 0u32);
    let mut right = (0.0f32, 0u32);
    for (row, &r) in x.iter().zip(residuals) {
        let v = row.get(feature_idx).copied().unwrap_or(0.0);
        let side = if v <= threshold { &mut left } else { &mut right };
        side.0 += r;
        side.1 += 1;
    }
    let mean = |(sum, count): (f32, u32)| if count == 0 { 0.0 } else { sum / count as f32 };
    (mean(left), mean(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable(n: usize, offset: f32) -> TrainDataset {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..n {
            let t = (i as f32 + offset) / n as f32;
            let class = usize::from(i % 2 == 1);
            // feature 0 separates the classes; feature 1 is noise.
            let signal = if class == 1 { 0.6 + 0.4 * t } else { 0.4 * t };
            x.push(vec![signal, ((i * 7) % 11) as f32 / 11.0]);
            y.push(class);
        }
        TrainDataset {
            feature_names: vec!["mean".into(), "kurtosis".into()],
            classes: vec!["female".into(), "male".into()],
            x,
            y,
        }
    }

    #[test]
    fn learns_separable_problem() {
        let train = separable(40, 0.0);
        let val = separable(10, 0.5);
        let options = TrainOptions {
            rounds: 20,
            learning_rate: 0.3,
            bins: 16,
        };
        let (model, log) = train_gbdt_stump_with_eval(&train, Some(&val), &options).unwrap();
        assert_eq!(model.stumps.len(), 20);
        assert_eq!(log.rounds.len(), 20);
        let last = log.last().unwrap();
        assert_eq!(last.train_accuracy, 1.0);
        assert_eq!(last.val_accuracy, Some(1.0));
        assert!(last.train_logloss < log.rounds[0].train_logloss);
        assert_eq!(model.feature_importance()[0].1, 1.0);
    }

    #[test]
    fn training_is_deterministic() {
        let train = separable(30, 0.0);
        let options = TrainOptions::default();
        let a = train_gbdt_stump(&train, &options).unwrap();
        let b = train_gbdt_stump(&train, &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn log_without_validation_has_no_val_scores() {
        let options = TrainOptions {
            rounds: 3,
            ..TrainOptions::default()
        };
        let (_, log) = train_gbdt_stump_with_eval(&separable(10, 0.0), None, &options).unwrap();
        assert!(log.rounds.iter().all(|r| r.val_logloss.is_none()));
        assert_eq!(log.rounds[2].round, 3);
    }

    #[test]
    fn rejects_bad_inputs() {
        let mut data = separable(10, 0.0);
        data.y.pop();
        assert!(train_gbdt_stump(&data, &TrainOptions::default()).is_err());

        let train = separable(10, 0.0);
        let mut val = separable(4, 0.0);
        val.feature_names = vec!["std".into(), "kurtosis".into()];
        assert!(train_gbdt_stump_with_eval(&train, Some(&val), &TrainOptions::default()).is_err());
    }

    #[test]
    fn builds_from_table_with_label_column() {
        let table = FeatureTable::new(
            vec!["mean".into(), "label".into(), "modindx".into()],
            vec![vec![0.1, 1.0, 0.5], vec![0.9, 0.0, 0.25]],
        )
        .unwrap();
        let data = TrainDataset::from_table(&table, "label", &["female", "male"]).unwrap();
        assert_eq!(data.feature_names, vec!["mean", "modindx"]);
        assert_eq!(data.y, vec![1, 0]);
        assert_eq!(data.x[1], vec![0.9, 0.25]);

        let bad = FeatureTable::new(vec!["label".into()], vec![vec![2.0]]).unwrap();
        assert!(TrainDataset::from_table(&bad, "label", &["female", "male"]).is_err());
    }
}
