//! The trained model artifact and its on-disk format.
//!
//! File layout (little-endian):
//!
//! ```text
//! magic     4 bytes   b"MDRK"
//! version   u32       format version of the payload
//! checksum  u32       CRC32 of the payload bytes
//! length    u64       payload length in bytes
//! payload   JSON      ModelArtifact, named fields
//! ```
//!
//! Hyperparameter fields in the payload carry serde defaults, so artifacts
//! written by older builds that lack them still load. A version newer than
//! [`FORMAT_VERSION`] is refused.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::DoctorRecord;
use crate::error::Result;
use crate::ml::MLError;
use crate::ml::forest::RandomForest;
use crate::ml::labels::MultiLabelBinarizer;
use crate::ml::scaler::{FeatureTransformer, default_categorical_features, default_numeric_features};

/// File magic.
pub const MAGIC: &[u8; 4] = b"MDRK";

/// Newest payload format this build reads and the one it writes.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 4 + 8;

fn default_n_estimators() -> usize {
    100
}

fn default_random_seed() -> u64 {
    42
}

/// Everything needed to answer classifier queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    #[serde(default = "default_numeric_features")]
    pub numeric_features: Vec<String>,
    #[serde(default = "default_categorical_features")]
    pub categorical_features: Vec<String>,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,

    pub classifier: RandomForest,
    pub transformer: FeatureTransformer,
    pub labels: MultiLabelBinarizer,
    /// Training entities in row order.
    pub doctors: Vec<DoctorRecord>,

    /// Per-doctor label probabilities, row-aligned with `doctors`.
    #[serde(skip)]
    probabilities: Vec<Vec<f64>>,
}

impl ModelArtifact {
    /// Assemble an artifact from fitted parts and precompute probabilities.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n_estimators: usize,
        random_seed: u64,
        numeric_features: Vec<String>,
        categorical_features: Vec<String>,
        classifier: RandomForest,
        transformer: FeatureTransformer,
        labels: MultiLabelBinarizer,
        doctors: Vec<DoctorRecord>,
    ) -> Result<Self> {
        let mut artifact = ModelArtifact {
            n_estimators,
            random_seed,
            numeric_features,
            categorical_features,
            trained_at: Some(Utc::now()),
            classifier,
            transformer,
            labels,
            doctors,
            probabilities: Vec::new(),
        };
        artifact.prepare()?;
        Ok(artifact)
    }

    /// Probability of every label for the doctor at `row`.
    pub fn probabilities(&self, row: usize) -> Option<&[f64]> {
        self.probabilities.get(row).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }

    /// Check internal consistency and fill the probability cache.
    fn prepare(&mut self) -> Result<()> {
        let invalid = |message: String| MLError::InvalidFeatureVector { message };

        if self.transformer.numeric_features() != self.numeric_features.as_slice()
            || self.transformer.categorical_features() != self.categorical_features.as_slice()
        {
            return Err(invalid("feature lists disagree with the fitted transformer".to_string()).into());
        }
        if self.classifier.n_features() != self.transformer.n_features() {
            return Err(invalid(format!(
                "classifier expects {} features, transformer yields {}",
                self.classifier.n_features(),
                self.transformer.n_features()
            ))
            .into());
        }
        if self.classifier.n_labels() != self.labels.len() {
            return Err(invalid(format!(
                "classifier predicts {} labels, label space has {}",
                self.classifier.n_labels(),
                self.labels.len()
            ))
            .into());
        }
        self.classifier.validate().map_err(invalid)?;

        let rows = self.transformer.transform_all(&self.doctors)?;
        self.probabilities = self.classifier.predict_proba_all(&rows)?;
        Ok(())
    }

    /// Write the artifact to `path`, creating parent directories.
    ///
    /// The file is written next to its destination and renamed into place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let save_error = |reason: String| MLError::ModelSaveError {
            path: path.display().to_string(),
            reason,
        };

        let bytes = self.to_bytes().map_err(|e| save_error(e.to_string()))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| save_error(e.to_string()))?;
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes).map_err(|e| save_error(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| save_error(e.to_string()))?;

        tracing::info!(
            "saved model artifact to {} ({} bytes, {} doctors, {} labels)",
            path.display(),
            bytes.len(),
            self.doctors.len(),
            self.labels.len()
        );
        Ok(())
    }

    /// Read an artifact from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| MLError::ModelLoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let artifact = Self::from_bytes(&bytes).map_err(|e| match e {
            crate::error::MedirankError::Ml(MLError::IncompatibleArtifact { found, supported }) => {
                MLError::IncompatibleArtifact { found, supported }
            }
            other => MLError::ModelLoadError {
                path: path.display().to_string(),
                reason: other.to_string(),
            },
        })?;

        tracing::info!(
            "loaded model artifact from {} ({} doctors, {} labels, {} trees)",
            path.display(),
            artifact.doctors.len(),
            artifact.labels.len(),
            artifact.classifier.n_estimators()
        );
        Ok(artifact)
    }

    /// Encode into the enveloped byte format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(self)?;
        encode_envelope(FORMAT_VERSION, &payload)
    }

    /// Decode from the enveloped byte format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (version, payload) = decode_envelope(bytes)?;
        if version > FORMAT_VERSION {
            return Err(MLError::IncompatibleArtifact {
                found: version,
                supported: FORMAT_VERSION,
            }
            .into());
        }

        let mut artifact: ModelArtifact = serde_json::from_slice(payload)?;
        artifact.prepare()?;
        Ok(artifact)
    }
}

/// Wrap a payload in the artifact header.
pub fn encode_envelope(version: u32, payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.write_all(MAGIC)?;
    out.write_u32::<LittleEndian>(version)?;
    out.write_u32::<LittleEndian>(crc32fast::hash(payload))?;
    out.write_u64::<LittleEndian>(payload.len() as u64)?;
    out.write_all(payload)?;
    Ok(out)
}

/// Split an enveloped buffer into its version and verified payload.
pub fn decode_envelope(bytes: &[u8]) -> Result<(u32, &[u8])> {
    let corrupt = |reason: &str| MLError::CorruptArtifact {
        reason: reason.to_string(),
    };

    if bytes.len() < HEADER_LEN {
        return Err(corrupt("file shorter than header").into());
    }

    let mut cursor = Cursor::new(bytes);
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(corrupt("bad magic").into());
    }

    let version = cursor.read_u32::<LittleEndian>()?;
    let checksum = cursor.read_u32::<LittleEndian>()?;
    let length = cursor.read_u64::<LittleEndian>()?;

    let payload = &bytes[HEADER_LEN..];
    if payload.len() as u64 != length {
        return Err(corrupt("payload length mismatch").into());
    }
    if crc32fast::hash(payload) != checksum {
        return Err(corrupt("checksum mismatch").into());
    }

    Ok((version, payload))
}
