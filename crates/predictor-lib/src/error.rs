//! Error types for artifact loading and prediction

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading model artifacts at startup.
///
/// These are fatal: a process that cannot load its artifacts must not serve
/// predictions.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load ONNX model {path:?}: {message}")]
    Onnx { path: PathBuf, message: String },

    #[error("inconsistent artifacts: {0}")]
    Inconsistent(String),

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// Input vector has the wrong number of gene-expression values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Expected {expected} genes, got {actual}")]
pub struct InvalidInputError {
    pub expected: usize,
    pub actual: usize,
}

/// Per-call prediction failure. The loaded state is never touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictorError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    #[error("non-finite expression value at gene position {position}")]
    NonFiniteInput { position: usize },

    #[error("inference failed: {0}")]
    Inference(String),
}
