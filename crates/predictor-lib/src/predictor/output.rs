//! Prediction output assembly
//!
//! Turns a classifier's label and probability row into a `PredictionResult`
//! with the model's static details attached.

use crate::error::PredictorError;
use crate::models::{GeneMetadata, ModelSummary, PredictionResult};
use ndarray::ArrayView1;
use std::collections::BTreeMap;

/// Formats raw classifier outputs into a `PredictionResult`
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    summary: ModelSummary,
}

impl OutputFormatter {
    pub fn new(metadata: &GeneMetadata) -> Self {
        Self {
            summary: ModelSummary {
                name: metadata.model_name.clone(),
                accuracy: metadata.test_accuracy,
                n_features: metadata.n_features,
            },
        }
    }

    /// Build the result for one row.
    ///
    /// `probabilities` must be in the same order as `classes`.
    pub fn format(
        &self,
        prediction: String,
        classes: &[String],
        probabilities: ArrayView1<f64>,
    ) -> Result<PredictionResult, PredictorError> {
        if probabilities.len() != classes.len() {
            return Err(PredictorError::Inference(format!(
                "classifier returned {} probabilities for {} classes",
                probabilities.len(),
                classes.len()
            )));
        }

        let confidence = probabilities
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let probabilities: BTreeMap<String, f64> = classes
            .iter()
            .cloned()
            .zip(probabilities.iter().copied())
            .collect();

        Ok(PredictionResult {
            prediction,
            confidence,
            probabilities,
            model_info: self.summary.clone(),
        })
    }
}
