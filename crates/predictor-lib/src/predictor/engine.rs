//! Loaded predictor context
//!
//! `CancerPredictor` owns every artifact needed for inference. It is built
//! once at startup and then only read, so a shared reference can be used
//! from any number of threads.

use super::{
    Classifier, ClassifierArtifact, FeatureSelector, OnnxClassifier, OutputFormatter, Scaler,
    ScalerArtifact,
};
use crate::artifacts::{ArtifactFile, ArtifactPaths, ChecksumManifest};
use crate::error::{ArtifactError, PredictorError};
use crate::models::{GeneMetadata, ModelInfo, PredictionResult, TOTAL_GENES_REQUIRED};
use ndarray::{Array1, Axis};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Immutable inference context: classifier, scaler, gene selection and metadata
pub struct CancerPredictor {
    selector: FeatureSelector,
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
    metadata: GeneMetadata,
    formatter: OutputFormatter,
}

impl std::fmt::Debug for CancerPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancerPredictor")
            .field("model_name", &self.metadata.model_name)
            .field("classifier", &self.classifier.name())
            .field("n_features", &self.selector.len())
            .finish()
    }
}

impl CancerPredictor {
    /// Load and cross-check all artifacts
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        info!(models_dir = %paths.models_dir.display(), "Loading model artifacts");

        let manifest = ChecksumManifest::load_optional(&paths.checksums_path())?;
        let read = |path: std::path::PathBuf| -> Result<ArtifactFile, ArtifactError> {
            let file = ArtifactFile::read(&path)?;
            manifest.verify(&file)?;
            Ok(file)
        };

        let metadata: GeneMetadata = read(paths.metadata_path())?.parse_json()?;
        let indices: Vec<usize> = read(paths.indices_path())?.parse_json()?;
        let scaler = read(paths.scaler_path())?
            .parse_json::<ScalerArtifact>()?
            .into_scaler();

        let classifier_file = read(paths.classifier_path())?;
        let classifier: Box<dyn Classifier> = if paths.classifier_is_onnx() {
            if metadata.class_labels.is_empty() {
                return Err(ArtifactError::Inconsistent(
                    "ONNX classifier requires class_labels in gene metadata".to_string(),
                ));
            }
            let model = OnnxClassifier::from_bytes(
                &classifier_file.bytes,
                metadata.n_features,
                metadata.class_labels.clone(),
            )
            .map_err(|e| ArtifactError::Onnx {
                path: classifier_file.path.clone(),
                message: format!("{e:#}"),
            })?;
            Box::new(model)
        } else {
            classifier_file
                .parse_json::<ClassifierArtifact>()?
                .into_classifier()
        };

        Self::from_parts(classifier, scaler, indices, metadata)
    }

    /// Assemble a predictor from already-constructed parts.
    ///
    /// Applies the same consistency checks as [`CancerPredictor::load`].
    pub fn from_parts(
        classifier: Box<dyn Classifier>,
        scaler: Box<dyn Scaler>,
        indices: Vec<usize>,
        metadata: GeneMetadata,
    ) -> Result<Self, ArtifactError> {
        let n_features = metadata.n_features;
        let check = |what: &str, actual: usize| {
            if actual == n_features {
                Ok(())
            } else {
                Err(ArtifactError::Inconsistent(format!(
                    "{} has {} entries, metadata declares {} features",
                    what, actual, n_features
                )))
            }
        };
        check("feature index list", indices.len())?;
        check("selected gene names", metadata.top_genes_names.len())?;
        check("scaler", scaler.n_features())?;
        check("classifier input", classifier.n_features())?;

        let classes = classifier.classes();
        if classes.len() != 2 {
            return Err(ArtifactError::Inconsistent(format!(
                "binary classifier expected, model has {} classes",
                classes.len()
            )));
        }
        if classes[0] == classes[1] {
            return Err(ArtifactError::Inconsistent(format!(
                "classifier labels must be distinct, both are {:?}",
                classes[0]
            )));
        }

        for (field, value) in [
            ("test_accuracy", metadata.test_accuracy),
            ("cv_accuracy", metadata.cv_accuracy),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ArtifactError::Inconsistent(format!(
                    "{} {} is not a fraction",
                    field, value
                )));
            }
        }

        let selector = FeatureSelector::new(indices, TOTAL_GENES_REQUIRED)?;
        let formatter = OutputFormatter::new(&metadata);

        info!(
            model_name = %metadata.model_name,
            classifier = classifier.name(),
            n_features,
            classes = ?classifier.classes(),
            test_accuracy = metadata.test_accuracy,
            "Predictor initialized"
        );

        Ok(Self {
            selector,
            scaler,
            classifier,
            metadata,
            formatter,
        })
    }

    /// Gather the model's genes from a raw expression vector, before scaling
    pub fn select_features(&self, input: &[f64]) -> Result<Array1<f64>, PredictorError> {
        self.selector.select(input)
    }

    /// Classify one expression vector of `TOTAL_GENES_REQUIRED` values
    pub fn predict(&self, input: &[f64]) -> Result<PredictionResult, PredictorError> {
        let start = Instant::now();

        let features = self.select_features(input).inspect_err(|e| {
            warn!(error = %e, "Rejected prediction input");
        })?;
        let batch = features.insert_axis(Axis(0));
        let scaled = self.scaler.transform(batch.view());

        let prediction = self
            .classifier
            .predict(scaled.view())?
            .into_iter()
            .next()
            .ok_or_else(|| PredictorError::Inference("classifier returned no label".to_string()))?;
        let proba = self.classifier.predict_proba(scaled.view())?;
        if proba.nrows() != 1 {
            return Err(PredictorError::Inference(format!(
                "classifier returned {} probability rows for 1 input",
                proba.nrows()
            )));
        }

        let result = self
            .formatter
            .format(prediction, self.classifier.classes(), proba.row(0))?;

        debug!(
            prediction = %result.prediction,
            confidence = result.confidence,
            elapsed_us = start.elapsed().as_micros(),
            "Prediction completed"
        );

        Ok(result)
    }

    /// Static model details
    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_name: self.metadata.model_name.clone(),
            test_accuracy: self.metadata.test_accuracy,
            cv_accuracy: self.metadata.cv_accuracy,
            n_features: self.metadata.n_features,
            total_genes_required: self.selector.total_genes(),
            top_genes: self.metadata.top_genes_names.clone(),
        }
    }

    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }
}

/// Predict the cancer type for one gene-expression vector
pub fn predict_cancer_type(
    predictor: &CancerPredictor,
    gene_expression: &[f64],
) -> Result<PredictionResult, PredictorError> {
    predictor.predict(gene_expression)
}

/// Information about the loaded model
pub fn get_model_info(predictor: &CancerPredictor) -> ModelInfo {
    predictor.model_info()
}
