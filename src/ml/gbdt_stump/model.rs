use serde::{Deserialize, Serialize};
use std::path::Path;

/// Single-split regression tree used as a weak learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stump {
    pub feature_index: u16,
    /// Threshold in feature units.
    pub threshold: f32,
    /// Prediction for `feature <= threshold`.
    pub left_value: f32,
    /// Prediction for `feature > threshold`.
    pub right_value: f32,
}

impl Stump {
    pub fn predict(&self, features: &[f32]) -> f32 {
        let value = features
            .get(self.feature_index as usize)
            .copied()
            .unwrap_or(0.0);
        if value <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Boosted stump ensemble with one logit per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtStumpModel {
    /// Model format version.
    pub model_version: i64,
    /// Column names of the feature vector, in input order.
    pub feature_names: Vec<String>,
    /// Class names; the class index is the position in this list.
    pub classes: Vec<String>,
    pub learning_rate: f32,
    /// Initial raw logits before boosting rounds.
    pub init_raw: Vec<f32>,
    /// Shape: `[n_rounds][n_classes]`.
    pub stumps: Vec<Vec<Stump>>,
}

impl GbdtStumpModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.init_raw.len() != self.classes.len() {
            return Err("init_raw length must match classes length".to_string());
        }
        for (round_idx, round) in self.stumps.iter().enumerate() {
            if round.len() != self.classes.len() {
                return Err(format!(
                    "Round {round_idx} has {} stumps but expected {}",
                    round.len(),
                    self.classes.len()
                ));
            }
            if let Some(stump) = round
                .iter()
                .find(|s| s.feature_index as usize >= self.feature_names.len())
            {
                return Err(format!(
                    "Round {round_idx} splits on feature {} but the model has {} features",
                    stump.feature_index,
                    self.feature_names.len()
                ));
            }
        }
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|err| err.to_string())?;
        let model: Self = serde_json::from_slice(&bytes).map_err(|err| err.to_string())?;
        model.validate()?;
        Ok(model)
    }

    /// Write the model as pretty JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(|err| err.to_string())?;
        std::fs::write(path, bytes).map_err(|err| err.to_string())
    }

    pub fn predict_raw(&self, features: &[f32]) -> Vec<f32> {
        let mut raw = self.init_raw.clone();
        for round in &self.stumps {
            for (class_idx, stump) in round.iter().enumerate() {
                raw[class_idx] += self.learning_rate * stump.predict(features);
            }
        }
        raw
    }

    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        softmax(&self.predict_raw(features))
    }

    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_raw(features))
    }

    /// Share of stumps splitting on each feature, in feature order.
    ///
    /// Shares sum to 1 for a trained model and are all 0 for an empty one.
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let mut counts = vec![0usize; self.feature_names.len()];
        let mut total = 0usize;
        for stump in self.stumps.iter().flatten() {
            if let Some(count) = counts.get_mut(stump.feature_index as usize) {
                *count += 1;
                total += 1;
            }
        }
        self.feature_names
            .iter()
            .cloned()
            .zip(counts)
            .map(|(name, count)| {
                let share = if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64
                };
                (name, share)
            })
            .collect()
    }
}

/// Numerically stable softmax.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut exps: Vec<f32> = raw.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}

pub(super) fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn stump(feature_index: u16, left_value: f32) -> Stump {
        Stump {
            feature_index,
            threshold: 0.5,
            left_value,
            right_value: -left_value,
        }
    }

    fn model() -> GbdtStumpModel {
        GbdtStumpModel {
            model_version: 1,
            feature_names: vec!["mean".into(), "skewness".into(), "modindx".into()],
            classes: vec!["female".into(), "male".into()],
            learning_rate: 1.0,
            init_raw: vec![0.0, 0.0],
            stumps: vec![
                vec![stump(0, 1.0), stump(0, -1.0)],
                vec![stump(2, 0.5), stump(0, -0.5)],
            ],
        }
    }

    #[test]
    fn stump_predict_branches() {
        let s = stump(0, -1.0);
        assert_eq!(s.predict(&[0.0]), -1.0);
        assert_eq!(s.predict(&[0.5]), -1.0);
        assert_eq!(s.predict(&[0.6]), 1.0);
    }

    #[test]
    fn model_predicts_argmax() {
        let m = model();
        assert_eq!(m.predict_class_index(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(m.predict_class_index(&[1.0, 0.0, 1.0]), 1);
        let proba = m.predict_proba(&[0.0, 0.0, 0.0]);
        assert!((proba.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn importance_counts_stumps_per_feature() {
        let importance = model().feature_importance();
        assert_eq!(
            importance,
            vec![
                ("mean".to_string(), 0.75),
                ("skewness".to_string(), 0.0),
                ("modindx".to_string(), 0.25),
            ]
        );
    }

    #[test]
    fn validate_rejects_out_of_range_feature() {
        let mut m = model();
        m.stumps[1][0].feature_index = 3;
        assert!(m.validate().unwrap_err().contains("feature 3"));
    }

    #[test]
    fn json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results").join("model.json");
        let m = model();
        m.save_json(&path).unwrap();
        assert_eq!(GbdtStumpModel::load_json(&path).unwrap(), m);
    }
}
