//! Kernel support vector classifier
//!
//! Evaluates a binary SVC exported from a libsvm-style trainer: support
//! vectors, signed dual coefficients and an intercept give the decision
//! value, and Platt scaling parameters turn it into class probabilities.

use super::linear::sigmoid;
use super::Classifier;
use crate::error::PredictorError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::Deserialize;

/// Probabilities are kept away from exactly 0 and 1
const MIN_PROBABILITY: f64 = 1e-7;

/// Kernel function applied between a support vector and an input row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, coef0: f64, degree: i32 },
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Kernel {
    pub fn evaluate(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match *self {
            Kernel::Linear => a.dot(&b),
            Kernel::Rbf { gamma } => {
                let squared_distance: f64 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(x, y)| (x - y).powi(2))
                    .sum();
                (-gamma * squared_distance).exp()
            }
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => (gamma * a.dot(&b) + coef0).powi(degree),
            Kernel::Sigmoid { gamma, coef0 } => (gamma * a.dot(&b) + coef0).tanh(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KernelKind {
    Linear,
    Rbf,
    Poly,
    Sigmoid,
}

/// On-disk layout of an SVC artifact
#[derive(Debug, Clone, Deserialize)]
struct SvcArtifact {
    kernel: KernelKind,
    #[serde(default)]
    gamma: Option<f64>,
    #[serde(default)]
    coef0: f64,
    #[serde(default = "default_degree")]
    degree: i32,
    #[serde(deserialize_with = "crate::models::deserialize_labels")]
    classes: Vec<String>,
    support_vectors: Vec<Vec<f64>>,
    dual_coef: Vec<f64>,
    intercept: f64,
    prob_a: f64,
    prob_b: f64,
}

fn default_degree() -> i32 {
    3
}

/// Binary kernel SVC with Platt-scaled probabilities.
///
/// The decision value is `sum_j dual_coef[j] * K(sv_j, x) + intercept`; a
/// positive value selects `classes[1]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "SvcArtifact")]
pub struct SupportVectorClassifier {
    kernel: Kernel,
    classes: Vec<String>,
    support_vectors: Array2<f64>,
    dual_coef: Array1<f64>,
    intercept: f64,
    prob_a: f64,
    prob_b: f64,
}

impl TryFrom<SvcArtifact> for SupportVectorClassifier {
    type Error = String;

    fn try_from(raw: SvcArtifact) -> Result<Self, Self::Error> {
        let gamma = || {
            raw.gamma
                .ok_or_else(|| format!("{:?} kernel requires gamma", raw.kernel))
        };
        let kernel = match raw.kernel {
            KernelKind::Linear => Kernel::Linear,
            KernelKind::Rbf => Kernel::Rbf { gamma: gamma()? },
            KernelKind::Poly => Kernel::Poly {
                gamma: gamma()?,
                coef0: raw.coef0,
                degree: raw.degree,
            },
            KernelKind::Sigmoid => Kernel::Sigmoid {
                gamma: gamma()?,
                coef0: raw.coef0,
            },
        };

        Self::new(
            kernel,
            raw.classes,
            raw.support_vectors,
            raw.dual_coef,
            raw.intercept,
            raw.prob_a,
            raw.prob_b,
        )
    }
}

impl SupportVectorClassifier {
    pub fn new(
        kernel: Kernel,
        classes: Vec<String>,
        support_vectors: Vec<Vec<f64>>,
        dual_coef: Vec<f64>,
        intercept: f64,
        prob_a: f64,
        prob_b: f64,
    ) -> Result<Self, String> {
        if classes.len() != 2 {
            return Err(format!("SVC must have 2 classes, got {}", classes.len()));
        }
        if support_vectors.is_empty() {
            return Err("SVC has no support vectors".to_string());
        }
        if support_vectors.len() != dual_coef.len() {
            return Err(format!(
                "{} support vectors but {} dual coefficients",
                support_vectors.len(),
                dual_coef.len()
            ));
        }

        let width = support_vectors[0].len();
        if support_vectors.iter().any(|sv| sv.len() != width) {
            return Err("support vectors have differing lengths".to_string());
        }
        let rows = support_vectors.len();
        let flat: Vec<f64> = support_vectors.into_iter().flatten().collect();
        let support_vectors =
            Array2::from_shape_vec((rows, width), flat).map_err(|e| e.to_string())?;

        Ok(Self {
            kernel,
            classes,
            support_vectors,
            dual_coef: Array1::from(dual_coef),
            intercept,
            prob_a,
            prob_b,
        })
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Signed distance from the separating surface, one value per row
    pub fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.axis_iter(Axis(0))
            .map(|row| {
                self.support_vectors
                    .axis_iter(Axis(0))
                    .zip(self.dual_coef.iter())
                    .map(|(sv, coef)| coef * self.kernel.evaluate(sv, row))
                    .sum::<f64>()
                    + self.intercept
            })
            .collect()
    }

    /// Platt-scaled probability of `classes[0]`
    fn first_class_probability(&self, decision: f64) -> f64 {
        // Platt parameters are fitted against the opposite sign convention
        sigmoid(decision * self.prob_a - self.prob_b).clamp(MIN_PROBABILITY, 1.0 - MIN_PROBABILITY)
    }

    /// Decision values for a batch of the right width, all finite
    fn checked_decisions(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, PredictorError> {
        if x.ncols() != self.support_vectors.ncols() {
            return Err(PredictorError::Inference(format!(
                "SVC expects {} features, got {}",
                self.support_vectors.ncols(),
                x.ncols()
            )));
        }
        let decisions = self.decision_function(x);
        if let Some(row) = decisions.iter().position(|d| !d.is_finite()) {
            return Err(PredictorError::Inference(format!(
                "SVC decision value for row {} is {}",
                row, decisions[row]
            )));
        }
        Ok(decisions)
    }
}

impl Classifier for SupportVectorClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.support_vectors.ncols()
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<String>, PredictorError> {
        Ok(self
            .checked_decisions(x)?
            .iter()
            .map(|&d| {
                let idx = if d > 0.0 { 1 } else { 0 };
                self.classes[idx].clone()
            })
            .collect())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PredictorError> {
        let decisions = self.checked_decisions(x)?;
        let mut proba = Array2::zeros((decisions.len(), 2));
        for (mut row, &d) in proba.axis_iter_mut(Axis(0)).zip(decisions.iter()) {
            let p0 = self.first_class_probability(d);
            row[0] = p0;
            row[1] = 1.0 - p0;
        }
        Ok(proba)
    }

    fn name(&self) -> &str {
        "svc"
    }
}
