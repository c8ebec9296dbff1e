//! Integration tests for artifact loading and prediction

use ndarray::{Array2, ArrayView2, Axis};
use predictor_lib::{
    artifacts::compute_checksum,
    get_model_info, predict_cancer_type,
    predictor::StandardScaler,
    ArtifactError, ArtifactPaths, CancerPredictor, Classifier, GeneMetadata, InvalidInputError,
    PredictorError, TOTAL_GENES_REQUIRED,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn metadata(n_features: usize) -> serde_json::Value {
    json!({
        "model_name": "Logistic Regression",
        "test_accuracy": 0.9412,
        "cv_accuracy": 0.9643,
        "n_features": n_features,
        "top_genes_names": (0..n_features).map(|i| format!("GENE_{i}")).collect::<Vec<_>>()
    })
}

fn write_json(dir: &Path, name: &str, value: &serde_json::Value) {
    fs::write(dir.join(name), serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// Writes the reference fixture: genes [0, 2, 4], identity scaling and a
/// logistic model that only looks at the second selected column.
fn write_fixture(dir: &Path) {
    write_json(dir, "gene_metadata.json", &metadata(3));
    write_json(dir, "top_genes_indices.json", &json!([0, 2, 4]));
    write_json(
        dir,
        "scaler.json",
        &json!({"type": "standard", "mean": [0.0, 0.0, 0.0], "scale": [1.0, 1.0, 1.0]}),
    );
    write_json(
        dir,
        "best_model_svm_rbf.json",
        &json!({
            "type": "logistic_regression",
            "classes": ["ALL", "AML"],
            "coef": [0.0, 3.0, 0.0],
            "intercept": -1.0
        }),
    );
}

fn fixture() -> (TempDir, CancerPredictor) {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let predictor = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap();
    (dir, predictor)
}

fn input_with(position: usize, value: f64) -> Vec<f64> {
    let mut input = vec![0.0; TOTAL_GENES_REQUIRED];
    input[position] = value;
    input
}

/// Deterministic stand-in: probability of the second class is the first
/// scaled column, clamped to [0, 1].
struct FirstColumnClassifier {
    classes: Vec<String>,
    width: usize,
}

impl Classifier for FirstColumnClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.width
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<String>, PredictorError> {
        Ok(x.axis_iter(Axis(0))
            .map(|row| {
                let idx = if row[0] > 0.5 { 1 } else { 0 };
                self.classes[idx].clone()
            })
            .collect())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PredictorError> {
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for (row, mut out) in x.axis_iter(Axis(0)).zip(proba.axis_iter_mut(Axis(0))) {
            let p = row[0].clamp(0.0, 1.0);
            out[0] = 1.0 - p;
            out[1] = p;
        }
        Ok(proba)
    }
}

fn stand_in(classes: &[&str], width: usize) -> Box<dyn Classifier> {
    Box::new(FirstColumnClassifier {
        classes: classes.iter().map(|c| c.to_string()).collect(),
        width,
    })
}

fn gene_metadata(n_features: usize) -> GeneMetadata {
    serde_json::from_value(metadata(n_features)).unwrap()
}

#[test]
fn test_selected_features_before_scaling() {
    let (_dir, predictor) = fixture();
    let selected = predictor.select_features(&input_with(2, 1.0)).unwrap();
    assert_eq!(selected.to_vec(), vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_predict_end_to_end() {
    let (_dir, predictor) = fixture();
    let result = predict_cancer_type(&predictor, &input_with(2, 1.0)).unwrap();

    // z = 3 * 1.0 - 1 = 2
    let p_aml = 1.0 / (1.0 + (-2.0f64).exp());
    assert_eq!(predictor.classes(), ["ALL", "AML"]);
    assert_eq!(result.prediction, "AML");
    assert!((result.probabilities["AML"] - p_aml).abs() < 1e-12);
    assert!((result.probabilities["ALL"] - (1.0 - p_aml)).abs() < 1e-12);
    assert_eq!(result.model_info.name, "Logistic Regression");
    assert_eq!(result.model_info.accuracy, 0.9412);
    assert_eq!(result.model_info.n_features, 3);
}

#[test]
fn test_confidence_is_max_and_probabilities_sum_to_one() {
    let (_dir, predictor) = fixture();
    for (position, value) in [(0, 5.0), (2, -3.0), (2, 0.3), (4, 100.0), (7128, 1.0)] {
        let result = predictor.predict(&input_with(position, value)).unwrap();
        assert_eq!(result.probabilities.len(), 2);

        let max = result
            .probabilities
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = result.probabilities.values().sum();
        assert_eq!(result.confidence, max);
        assert!((sum - 1.0).abs() < 1e-9, "probabilities sum to {}", sum);
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}

#[test]
fn test_invalid_lengths_rejected() {
    let (_dir, predictor) = fixture();
    for len in [0, 100, 7128, 7130] {
        let err = predict_cancer_type(&predictor, &vec![0.0; len]).unwrap_err();
        assert_eq!(
            err,
            PredictorError::InvalidInput(InvalidInputError {
                expected: 7129,
                actual: len
            })
        );
    }
}

#[test]
fn test_invalid_input_message() {
    let (_dir, predictor) = fixture();
    let err = predictor.predict(&[1.0; 100]).unwrap_err();
    assert_eq!(err.to_string(), "Expected 7129 genes, got 100");
}

#[test]
fn test_non_finite_selected_value_rejected() {
    let (_dir, predictor) = fixture();
    let err = predictor.predict(&input_with(4, f64::NAN)).unwrap_err();
    assert_eq!(err, PredictorError::NonFiniteInput { position: 4 });

    // Unselected genes are never read
    assert!(predictor.predict(&input_with(3, f64::NAN)).is_ok());
}

#[test]
fn test_model_info_is_pure() {
    let (_dir, predictor) = fixture();
    let first = get_model_info(&predictor);
    predictor.predict(&input_with(2, 1.0)).unwrap();
    let second = get_model_info(&predictor);

    assert_eq!(first, second);
    assert_eq!(first.total_genes_required, 7129);
    assert_eq!(first.model_name, "Logistic Regression");
    assert_eq!(first.test_accuracy, 0.9412);
    assert_eq!(first.cv_accuracy, 0.9643);
    assert_eq!(first.n_features, 3);
    assert_eq!(first.top_genes, vec!["GENE_0", "GENE_1", "GENE_2"]);
}

#[test]
fn test_selection_follows_index_list_order() {
    let input = {
        let mut v = vec![0.0; TOTAL_GENES_REQUIRED];
        v[10] = 0.9;
        v[20] = 0.1;
        v
    };

    let forward = CancerPredictor::from_parts(
        stand_in(&["ALL", "AML"], 2),
        Box::new(StandardScaler::identity(2)),
        vec![10, 20],
        gene_metadata(2),
    )
    .unwrap();
    let permuted = CancerPredictor::from_parts(
        stand_in(&["ALL", "AML"], 2),
        Box::new(StandardScaler::identity(2)),
        vec![20, 10],
        gene_metadata(2),
    )
    .unwrap();

    assert_eq!(forward.select_features(&input).unwrap().to_vec(), vec![0.9, 0.1]);
    assert_eq!(permuted.select_features(&input).unwrap().to_vec(), vec![0.1, 0.9]);

    let a = forward.predict(&input).unwrap();
    let b = permuted.predict(&input).unwrap();
    assert_eq!(a.prediction, "AML");
    assert_eq!(b.prediction, "ALL");
    assert_ne!(a.probabilities, b.probabilities);
}

#[test]
fn test_svc_artifact_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    write_json(
        dir.path(),
        "best_model_svm_rbf.json",
        &json!({
            "type": "svc",
            "kernel": "rbf",
            "gamma": 0.5,
            "classes": ["ALL", "AML"],
            "support_vectors": [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            "dual_coef": [-1.0, 1.0],
            "intercept": 0.0,
            "prob_a": -2.0,
            "prob_b": 0.0
        }),
    );
    let predictor = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap();

    let near_aml = predictor.predict(&input_with(2, 1.0)).unwrap();
    assert_eq!(near_aml.prediction, "AML");
    assert!(near_aml.probabilities["AML"] > near_aml.probabilities["ALL"]);

    let near_all = predictor.predict(&vec![0.0; TOTAL_GENES_REQUIRED]).unwrap();
    assert_eq!(near_all.prediction, "ALL");
    assert!(near_all.probabilities["ALL"] > near_all.probabilities["AML"]);
    assert_eq!(near_all.confidence, near_all.probabilities["ALL"]);
}

#[test]
fn test_scaler_applied_before_classification() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    // Shifts the middle column so that a raw 1.0 scales to 0.0
    write_json(
        dir.path(),
        "scaler.json",
        &json!({"type": "standard", "mean": [0.0, 1.0, 0.0], "scale": [1.0, 2.0, 1.0]}),
    );
    let predictor = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap();

    let result = predictor.predict(&input_with(2, 1.0)).unwrap();
    // z = 3 * 0.0 - 1
    assert_eq!(result.prediction, "ALL");
}

#[test]
fn test_missing_artifact_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    fs::remove_file(dir.path().join("scaler.json")).unwrap();

    let err = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::Io { .. }));
}

#[test]
fn test_corrupt_artifact_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    fs::write(dir.path().join("top_genes_indices.json"), b"[0, 2,").unwrap();

    let err = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::Parse { .. }));
}

#[test]
fn test_index_out_of_range_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    write_json(dir.path(), "top_genes_indices.json", &json!([0, 2, 7129]));

    let err = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::Inconsistent(_)));
}

#[test]
fn test_feature_count_mismatch_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    write_json(dir.path(), "top_genes_indices.json", &json!([0, 2]));

    let err = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap_err();
    assert!(err.to_string().contains("feature index list"));
}

#[test]
fn test_non_binary_classifier_rejected() {
    let err = CancerPredictor::from_parts(
        stand_in(&["ALL", "AML", "CLL"], 3),
        Box::new(StandardScaler::identity(3)),
        vec![0, 2, 4],
        gene_metadata(3),
    )
    .unwrap_err();
    assert!(matches!(err, ArtifactError::Inconsistent(_)));
}

#[test]
fn test_duplicate_class_labels_rejected() {
    let err = CancerPredictor::from_parts(
        stand_in(&["AML", "AML"], 3),
        Box::new(StandardScaler::identity(3)),
        vec![0, 2, 4],
        gene_metadata(3),
    )
    .unwrap_err();
    assert!(matches!(err, ArtifactError::Inconsistent(_)));

    // Integer and string labels normalize to the same text
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    write_json(
        dir.path(),
        "best_model_svm_rbf.json",
        &json!({
            "type": "logistic_regression",
            "classes": [1, "1"],
            "coef": [0.0, 3.0, 0.0],
            "intercept": -1.0
        }),
    );
    let err = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap_err();
    assert!(err.to_string().contains("distinct"), "{}", err);
}

#[test]
fn test_checksum_manifest() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let scaler_digest = compute_checksum(&fs::read(dir.path().join("scaler.json")).unwrap());

    write_json(dir.path(), "checksums.json", &json!({ "scaler.json": scaler_digest }));
    assert!(CancerPredictor::load(&ArtifactPaths::new(dir.path())).is_ok());

    write_json(
        dir.path(),
        "checksums.json",
        &json!({ "scaler.json": compute_checksum(b"something else") }),
    );
    let err = CancerPredictor::load(&ArtifactPaths::new(dir.path())).unwrap_err();
    assert!(matches!(err, ArtifactError::ChecksumMismatch { ref file, .. } if file == "scaler.json"));
}

#[test]
fn test_onnx_classifier_requires_class_labels() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    fs::write(dir.path().join("model.onnx"), b"placeholder").unwrap();
    let paths = ArtifactPaths {
        classifier_file: "model.onnx".to_string(),
        ..ArtifactPaths::new(dir.path())
    };

    let err = CancerPredictor::load(&paths).unwrap_err();
    assert!(matches!(err, ArtifactError::Inconsistent(_)));
}

#[test]
fn test_onnx_classifier_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut meta = metadata(2);
    meta["class_labels"] = json!(["ALL", "AML"]);
    write_json(dir.path(), "gene_metadata.json", &meta);
    write_json(dir.path(), "top_genes_indices.json", &json!([0, 2]));
    write_json(
        dir.path(),
        "scaler.json",
        &json!({"type": "standard", "mean": [0.0, 0.0], "scale": [1.0, 1.0]}),
    );
    fs::copy(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/softmax_classifier.onnx"),
        dir.path().join("model.onnx"),
    )
    .unwrap();
    let paths = ArtifactPaths {
        classifier_file: "model.onnx".to_string(),
        ..ArtifactPaths::new(dir.path())
    };
    let predictor = CancerPredictor::load(&paths).unwrap();
    assert_eq!(predictor.classes(), ["ALL", "AML"]);

    // Selected [0.0, 1.0] -> softmax puts e / (1 + e) on AML
    let result = predict_cancer_type(&predictor, &input_with(2, 1.0)).unwrap();
    let e = 1.0f64.exp();
    assert_eq!(result.prediction, "AML");
    assert!((result.probabilities["AML"] - e / (1.0 + e)).abs() < 1e-6);
    assert_eq!(result.confidence, result.probabilities["AML"]);
    let sum: f64 = result.probabilities.values().sum();
    assert!((sum - 1.0).abs() < 1e-6);

    let result = predict_cancer_type(&predictor, &input_with(0, 2.0)).unwrap();
    assert_eq!(result.prediction, "ALL");
    assert_eq!(result.confidence, result.probabilities["ALL"]);
}

#[test]
fn test_predictor_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CancerPredictor>();

    let (_dir, predictor) = fixture();
    let expected = predictor.predict(&input_with(2, 1.0)).unwrap();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| predictor.predict(&input_with(2, 1.0)).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
