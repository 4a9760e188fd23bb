//! Learning primitives behind the classifier-based recommender.
//!
//! - [`scaler`]: numeric standardization plus categorical passthrough
//! - [`labels`]: multi-label binarization of condition tags
//! - [`forest`]: a seeded multi-output random forest
//! - [`artifact`]: the versioned on-disk model artifact

pub mod artifact;
pub mod forest;
pub mod labels;
pub mod scaler;

/// Machine learning error types.
#[derive(Debug, thiserror::Error)]
pub enum MLError {
    #[error("Model not trained: {message}")]
    ModelNotTrained { message: String },

    #[error("Model training failed: {message}")]
    TrainingFailed { message: String },

    #[error("Invalid feature vector: {message}")]
    InvalidFeatureVector { message: String },

    #[error("Model loading failed: {path}: {reason}")]
    ModelLoadError { path: String, reason: String },

    #[error("Model saving failed: {path}: {reason}")]
    ModelSaveError { path: String, reason: String },

    #[error("Corrupt model artifact: {reason}")]
    CorruptArtifact { reason: String },

    #[error("Incompatible model artifact: format version {found}, newest supported is {supported}")]
    IncompatibleArtifact { found: u32, supported: u32 },
}
