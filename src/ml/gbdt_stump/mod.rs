//! Deterministic gradient-boosted decision-stump classifier.
//!
//! Softmax boosting over binned features: each round fits one stump per class
//! to the negative gradient. Training is fully deterministic, models export to
//! JSON, and an optional validation set is scored after every round.

mod model;
mod train;

pub use model::{GbdtStumpModel, Stump, softmax};
pub use train::{
    RoundMetrics, TrainDataset, TrainOptions, TrainingLog, train_gbdt_stump,
    train_gbdt_stump_with_eval,
};
