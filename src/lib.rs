//! Speaker-gender classification from spoken-digit audio.
//!
//! Recordings are resampled and framed, described by nine spectral statistics,
//! normalized per row and collected into a labeled dataset that is engineered,
//! split and fed to a gradient-boosted stump classifier.

pub mod analysis;
pub mod app_dirs;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod logging;
pub mod ml;
pub mod pipeline;
