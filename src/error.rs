//! Error types for the medirank library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`MedirankError`] enum. Recommendation queries that simply find nothing are
//! not errors; they return an empty list.
//!
//! # Examples
//!
//! ```
//! use medirank::error::{MedirankError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(MedirankError::invalid_argument("limit must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

use crate::ml::MLError;

/// The main error type for medirank operations.
#[derive(Error, Debug)]
pub enum MedirankError {
    /// I/O errors (artifact files, record files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Text analysis errors (tokenization, filtering)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// A single entity record could not be preprocessed
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Model training, inference or persistence errors
    #[error(transparent)]
    Ml(#[from] MLError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with MedirankError.
pub type Result<T> = std::result::Result<T, MedirankError>;

impl MedirankError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        MedirankError::Analysis(msg.into())
    }

    /// Create a new invalid record error.
    pub fn invalid_record<S: Into<String>>(msg: S) -> Self {
        MedirankError::InvalidRecord(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MedirankError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        MedirankError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        MedirankError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a training failure.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        MedirankError::Ml(MLError::TrainingFailed {
            message: msg.into(),
        })
    }

    /// True when this error means a model could not be trained.
    pub fn is_training_failure(&self) -> bool {
        matches!(self, MedirankError::Ml(MLError::TrainingFailed { .. }))
    }

    /// True when this error means a persisted model could not be loaded.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            MedirankError::Ml(
                MLError::ModelLoadError { .. }
                    | MLError::CorruptArtifact { .. }
                    | MLError::IncompatibleArtifact { .. }
            )
        )
    }
}
