//! Cancer-type prediction from gene-expression profiles
//!
//! This crate provides:
//! - Loading of the trained classifier, scaler, gene index list and metadata
//! - Selection and scaling of the model's genes from a full expression vector
//! - Binary classification with per-class probabilities
//! - Static model information

pub mod artifacts;
pub mod error;
pub mod models;
pub mod predictor;

pub use artifacts::ArtifactPaths;
pub use error::{ArtifactError, InvalidInputError, PredictorError};
pub use models::*;
pub use predictor::{get_model_info, predict_cancer_type, CancerPredictor, Classifier, Scaler};
