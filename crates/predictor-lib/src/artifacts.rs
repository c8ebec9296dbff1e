//! Model artifact files
//!
//! Locates the four artifacts under the models directory, reads them with
//! their SHA-256 digests, and checks them against an optional checksum
//! manifest (`checksums.json`, file name -> lowercase hex digest).

use crate::error::ArtifactError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_CLASSIFIER_FILE: &str = "best_model_svm_rbf.json";
pub const DEFAULT_SCALER_FILE: &str = "scaler.json";
pub const DEFAULT_INDICES_FILE: &str = "top_genes_indices.json";
pub const DEFAULT_METADATA_FILE: &str = "gene_metadata.json";
pub const DEFAULT_CHECKSUMS_FILE: &str = "checksums.json";

/// Where the model artifacts live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub models_dir: PathBuf,
    /// `.onnx` files are run with tract; anything else is read as JSON
    pub classifier_file: String,
    pub scaler_file: String,
    pub indices_file: String,
    pub metadata_file: String,
    pub checksums_file: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            classifier_file: DEFAULT_CLASSIFIER_FILE.to_string(),
            scaler_file: DEFAULT_SCALER_FILE.to_string(),
            indices_file: DEFAULT_INDICES_FILE.to_string(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            checksums_file: DEFAULT_CHECKSUMS_FILE.to_string(),
        }
    }
}

impl ArtifactPaths {
    /// Default file names under `models_dir`
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            ..Self::default()
        }
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.models_dir.join(&self.classifier_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.models_dir.join(&self.scaler_file)
    }

    pub fn indices_path(&self) -> PathBuf {
        self.models_dir.join(&self.indices_file)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.models_dir.join(&self.metadata_file)
    }

    pub fn checksums_path(&self) -> PathBuf {
        self.models_dir.join(&self.checksums_file)
    }

    pub fn classifier_is_onnx(&self) -> bool {
        Path::new(&self.classifier_file)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"))
    }
}

/// An artifact read into memory
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub sha256: String,
}

impl ArtifactFile {
    pub fn read(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let sha256 = compute_checksum(&bytes);

        info!(
            path = %path.display(),
            size = bytes.len(),
            sha256 = %sha256,
            "Read model artifact"
        );

        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            sha256,
        })
    }

    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, ArtifactError> {
        serde_json::from_slice(&self.bytes).map_err(|source| ArtifactError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Expected digests keyed by artifact file name
#[derive(Debug, Clone, Default)]
pub struct ChecksumManifest {
    entries: BTreeMap<String, String>,
}

impl ChecksumManifest {
    /// Load the manifest if present; a missing manifest verifies nothing
    pub fn load_optional(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            debug!(path = %path.display(), "No checksum manifest, skipping verification");
            return Ok(Self::default());
        }

        let file = ArtifactFile::read(path)?;
        let entries: BTreeMap<String, String> = file.parse_json()?;
        Ok(Self {
            entries: entries
                .into_iter()
                .map(|(name, digest)| (name, digest.to_ascii_lowercase()))
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check an artifact's digest against its manifest entry, if any
    pub fn verify(&self, artifact: &ArtifactFile) -> Result<(), ArtifactError> {
        let name = artifact.file_name();
        match self.entries.get(&name) {
            Some(expected) if *expected != artifact.sha256 => Err(ArtifactError::ChecksumMismatch {
                file: name,
                expected: expected.clone(),
                actual: artifact.sha256.clone(),
            }),
            Some(_) => {
                debug!(file = %name, "Checksum verified");
                Ok(())
            }
            None => {
                if !self.is_empty() {
                    warn!(file = %name, "Artifact not listed in checksum manifest");
                }
                Ok(())
            }
        }
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
