//! Feature selection from raw expression vectors
//!
//! Gathers the values at the precomputed gene positions, in the order the
//! model was trained on. The index list is not sorted: its order is the
//! column order seen by the scaler and classifier.

use crate::error::{ArtifactError, InvalidInputError, PredictorError};
use ndarray::Array1;

/// Selects the model's genes from a full-length expression vector
#[derive(Debug, Clone)]
pub struct FeatureSelector {
    indices: Vec<usize>,
    total_genes: usize,
}

impl FeatureSelector {
    pub fn new(indices: Vec<usize>, total_genes: usize) -> Result<Self, ArtifactError> {
        if indices.is_empty() {
            return Err(ArtifactError::Inconsistent(
                "feature index list is empty".to_string(),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= total_genes) {
            return Err(ArtifactError::Inconsistent(format!(
                "feature index {} out of range for {} genes",
                bad, total_genes
            )));
        }
        Ok(Self {
            indices,
            total_genes,
        })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn total_genes(&self) -> usize {
        self.total_genes
    }

    pub fn validate(&self, input: &[f64]) -> Result<(), InvalidInputError> {
        if input.len() != self.total_genes {
            return Err(InvalidInputError {
                expected: self.total_genes,
                actual: input.len(),
            });
        }
        Ok(())
    }

    /// Extract the selected genes, in index-list order
    pub fn select(&self, input: &[f64]) -> Result<Array1<f64>, PredictorError> {
        self.validate(input)?;
        self.indices
            .iter()
            .map(|&position| {
                let value = input[position];
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(PredictorError::NonFiniteInput { position })
                }
            })
            .collect()
    }
}
