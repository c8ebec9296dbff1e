//! Gene-expression inference pipeline

mod engine;
mod features;
mod inference;
mod linear;
mod output;
mod scaler;
mod svm;

pub use engine::{get_model_info, predict_cancer_type, CancerPredictor};
pub use features::FeatureSelector;
pub use inference::OnnxClassifier;
pub use linear::LogisticRegressionClassifier;
pub use output::OutputFormatter;
pub use scaler::{MinMaxScaler, ScalerArtifact, StandardScaler};
pub use svm::{Kernel, SupportVectorClassifier};

use crate::error::PredictorError;
use ndarray::{Array2, ArrayView2};
use serde::Deserialize;

/// A trained classifier over rows of scaled features
pub trait Classifier: Send + Sync {
    /// Output labels, in the column order of `predict_proba`
    fn classes(&self) -> &[String];

    /// Number of input columns the model was fitted on
    fn n_features(&self) -> usize;

    /// Predict one label per row
    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<String>, PredictorError>;

    /// Predict a probability distribution per row (`rows x classes`)
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PredictorError>;

    fn name(&self) -> &str {
        "classifier"
    }
}

/// A fitted feature transform
pub trait Scaler: Send + Sync {
    fn n_features(&self) -> usize;

    fn transform(&self, x: ArrayView2<f64>) -> Array2<f64>;
}

/// JSON classifier artifact, tagged by model family
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    Svc(SupportVectorClassifier),
    LogisticRegression(LogisticRegressionClassifier),
}

impl ClassifierArtifact {
    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ClassifierArtifact::Svc(model) => Box::new(model),
            ClassifierArtifact::LogisticRegression(model) => Box::new(model),
        }
    }
}
