//! Binary logistic regression

use super::Classifier;
use crate::error::PredictorError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::Deserialize;

/// Numerically stable logistic function
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LogisticArtifact {
    #[serde(deserialize_with = "crate::models::deserialize_labels")]
    classes: Vec<String>,
    coef: Vec<f64>,
    intercept: f64,
}

/// Logistic regression over scaled features; `classes[1]` is the positive class
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "LogisticArtifact")]
pub struct LogisticRegressionClassifier {
    classes: Vec<String>,
    coef: Array1<f64>,
    intercept: f64,
}

impl TryFrom<LogisticArtifact> for LogisticRegressionClassifier {
    type Error = String;

    fn try_from(raw: LogisticArtifact) -> Result<Self, Self::Error> {
        Self::new(raw.classes, raw.coef, raw.intercept)
    }
}

impl LogisticRegressionClassifier {
    pub fn new(classes: Vec<String>, coef: Vec<f64>, intercept: f64) -> Result<Self, String> {
        if classes.len() != 2 {
            return Err(format!(
                "logistic regression must have 2 classes, got {}",
                classes.len()
            ));
        }
        if coef.is_empty() {
            return Err("logistic regression has no coefficients".to_string());
        }
        Ok(Self {
            classes,
            coef: Array1::from(coef),
            intercept,
        })
    }

    pub fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&self.coef) + self.intercept
    }

    fn checked_decisions(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, PredictorError> {
        if x.ncols() != self.coef.len() {
            return Err(PredictorError::Inference(format!(
                "logistic regression expects {} features, got {}",
                self.coef.len(),
                x.ncols()
            )));
        }
        let decisions = self.decision_function(x);
        if let Some(row) = decisions.iter().position(|z| !z.is_finite()) {
            return Err(PredictorError::Inference(format!(
                "logistic regression decision value for row {} is {}",
                row, decisions[row]
            )));
        }
        Ok(decisions)
    }
}

impl Classifier for LogisticRegressionClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.coef.len()
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<String>, PredictorError> {
        Ok(self
            .checked_decisions(x)?
            .iter()
            .map(|&z| {
                let idx = if z > 0.0 { 1 } else { 0 };
                self.classes[idx].clone()
            })
            .collect())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PredictorError> {
        let decisions = self.checked_decisions(x)?;
        let mut proba = Array2::zeros((decisions.len(), 2));
        for (mut row, &z) in proba.axis_iter_mut(Axis(0)).zip(decisions.iter()) {
            let p1 = sigmoid(z);
            row[0] = 1.0 - p1;
            row[1] = p1;
        }
        Ok(proba)
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}
