//! Gender classifier training, inference and evaluation.

pub mod gbdt_stump;
pub mod metrics;

use gbdt_stump::{GbdtStumpModel, TrainDataset};
use metrics::{ConfusionMatrix, PerClassStats, accuracy, precision_recall_by_class};
use serde::{Deserialize, Serialize};

/// Class names in label order (female 0, male 1).
pub const GENDER_CLASSES: [&str; 2] = ["female", "male"];

/// Test-set scores of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f32,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<PerClassStats>,
}

/// Score `model` against every row of `dataset`.
pub fn evaluate(model: &GbdtStumpModel, dataset: &TrainDataset) -> Evaluation {
    let confusion = ConfusionMatrix::from_pairs(
        model.classes.len(),
        dataset
            .x
            .iter()
            .zip(&dataset.y)
            .map(|(row, &truth)| (truth, model.predict_class_index(row))),
    );
    Evaluation {
        accuracy: accuracy(&confusion),
        per_class: precision_recall_by_class(&confusion),
        confusion,
    }
}
