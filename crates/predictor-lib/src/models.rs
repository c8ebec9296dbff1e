//! Core data models for the cancer-type predictor

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Number of gene-expression values every input vector must carry
pub const TOTAL_GENES_REQUIRED: usize = 7129;

/// Static metadata saved next to the trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneMetadata {
    pub model_name: String,
    pub test_accuracy: f64,
    pub cv_accuracy: f64,
    pub n_features: usize,
    /// Display names of the selected genes, parallel to the feature index list
    pub top_genes_names: Vec<String>,
    /// Output labels, only needed by classifiers that do not carry their own
    #[serde(
        default,
        deserialize_with = "deserialize_labels",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub class_labels: Vec<String>,
}

/// Model details echoed with every prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    pub accuracy: f64,
    pub n_features: usize,
}

/// Outcome of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    /// Highest class probability
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
    pub model_info: ModelSummary,
}

/// Snapshot of the loaded model's static metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub test_accuracy: f64,
    pub cv_accuracy: f64,
    pub n_features: usize,
    pub total_genes_required: usize,
    pub top_genes: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Text(String),
    Integer(i64),
}

/// Class labels may be exported as strings ("ALL") or integers (0).
/// Both are normalized to their text form.
pub(crate) fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawLabel>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|label| match label {
            RawLabel::Text(text) => text,
            RawLabel::Integer(value) => value.to_string(),
        })
        .collect())
}
