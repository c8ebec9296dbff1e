//! ONNX classifier inference using tract
//!
//! Runs a classifier exported to ONNX (probability output as a plain tensor,
//! i.e. exported without a ZipMap) for models whose family has no native
//! implementation here.

use super::Classifier;
use crate::error::PredictorError;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Classifier backed by an optimized tract plan.
///
/// The last model output is read as the `[1, n_classes]` probability
/// tensor; the predicted label is the most probable class.
pub struct OnnxClassifier {
    model: TractModel,
    n_features: usize,
    classes: Vec<String>,
}

impl OnnxClassifier {
    /// Parse and optimize an ONNX model from bytes
    pub fn from_bytes(bytes: &[u8], n_features: usize, classes: Vec<String>) -> TractResult<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))?
            .with_input_fact(0, f32::fact([1, n_features]).into())?
            .into_optimized()?
            .into_runnable()?;
        Ok(Self {
            model,
            n_features,
            classes,
        })
    }

    fn run_row(&self, row: ArrayView1<f64>) -> Result<Vec<f64>, PredictorError> {
        let start = Instant::now();

        let data: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), data)
            .map_err(|e| PredictorError::Inference(e.to_string()))?
            .into();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PredictorError::Inference(format!("{e:#}")))?;
        let probabilities = outputs
            .last()
            .ok_or_else(|| PredictorError::Inference("no output from model".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| PredictorError::Inference(format!("{e:#}")))?
            .iter()
            .map(|&p| p as f64)
            .collect::<Vec<f64>>();

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "ONNX inference completed");
        }

        if probabilities.len() != self.classes.len() {
            return Err(PredictorError::Inference(format!(
                "model output has {} values, expected {}",
                probabilities.len(),
                self.classes.len()
            )));
        }
        Ok(probabilities)
    }

    fn check_width(&self, x: &ArrayView2<f64>) -> Result<(), PredictorError> {
        if x.ncols() != self.n_features {
            return Err(PredictorError::Inference(format!(
                "ONNX model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(())
    }
}

impl Classifier for OnnxClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<String>, PredictorError> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .axis_iter(Axis(0))
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (idx, &p)| {
                        if p > best.1 {
                            (idx, p)
                        } else {
                            best
                        }
                    })
                    .0;
                self.classes[best].clone()
            })
            .collect())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PredictorError> {
        self.check_width(&x)?;
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for (row, mut out) in x.axis_iter(Axis(0)).zip(proba.axis_iter_mut(Axis(0))) {
            let values = self.run_row(row)?;
            for (slot, value) in out.iter_mut().zip(values) {
                *slot = value;
            }
        }
        Ok(proba)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
