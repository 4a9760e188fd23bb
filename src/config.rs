//! Configuration for the recommenders.
//!
//! Every field has a default, so a configuration file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!   "classifier": { "n_estimators": 200, "max_depth": 12 },
//!   "location": { "max_distance_km": 35.0 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MedirankError, Result};
use crate::ml::forest::{ForestParams, MaxFeatures};
use crate::ml::scaler::{default_categorical_features, default_numeric_features};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MedirankConfig {
    /// Classifier training settings.
    pub classifier: ClassifierConfig,

    /// Location ranking defaults.
    pub location: LocationConfig,

    /// Where the trained model artifact is saved and loaded.
    pub model_path: PathBuf,

    /// Add the common conditions of a doctor's specialty before training.
    pub expand_specialty_conditions: bool,
}

impl Default for MedirankConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            location: LocationConfig::default(),
            model_path: PathBuf::from("models").join("doctor_recommender.mrk"),
            expand_specialty_conditions: false,
        }
    }
}

impl MedirankConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: MedirankConfig = serde_json::from_str(&content)
            .map_err(|e| MedirankError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no recommender can run with.
    pub fn validate(&self) -> Result<()> {
        if self.classifier.n_estimators == 0 {
            return Err(MedirankError::config("classifier.n_estimators must be at least 1"));
        }
        if self.classifier.n_jobs == Some(0) {
            return Err(MedirankError::config("classifier.n_jobs must be at least 1"));
        }
        if self.classifier.numeric_features.is_empty() && self.classifier.categorical_features.is_empty() {
            return Err(MedirankError::config("classifier needs at least one feature"));
        }
        if self.location.max_distance_km.is_nan() || self.location.max_distance_km < 0.0 {
            return Err(MedirankError::config("location.max_distance_km must be non-negative"));
        }
        Ok(())
    }
}

/// Settings for training the condition classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Number of trees in the forest.
    pub n_estimators: usize,

    /// Seed for bootstrap sampling and feature selection.
    pub random_seed: u64,

    /// Maximum tree depth. `None` grows trees until leaves are pure.
    pub max_depth: Option<usize>,

    /// Minimum samples a node needs before it may split.
    pub min_samples_split: usize,

    /// Features considered per split.
    pub max_features: MaxFeatures,

    /// Grow each tree on a bootstrap sample.
    pub bootstrap: bool,

    /// Worker threads for training.
    /// If None, uses the number of CPU cores.
    pub n_jobs: Option<usize>,

    /// Numeric doctor fields, standardized before training.
    pub numeric_features: Vec<String>,

    /// Categorical doctor fields, passed through as ordinals.
    pub categorical_features: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_seed: 42,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            n_jobs: None,
            numeric_features: default_numeric_features(),
            categorical_features: default_categorical_features(),
        }
    }
}

impl ClassifierConfig {
    /// Set the number of trees.
    pub fn with_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Forest hyperparameters for this configuration.
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.max_features,
            bootstrap: self.bootstrap,
            seed: self.random_seed,
            n_jobs: Some(self.n_jobs.unwrap_or_else(num_cpus::get)),
        }
    }
}

/// Defaults for location-based ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationConfig {
    /// Items farther than this are excluded.
    pub max_distance_km: f64,

    /// Maximum number of results.
    pub limit: usize,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            max_distance_km: 20.0,
            limit: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = MedirankConfig::default();
        assert_eq!(config.classifier.n_estimators, 100);
        assert_eq!(config.classifier.random_seed, 42);
        assert_eq!(config.location.max_distance_km, 20.0);
        assert_eq!(config.location.limit, 10);
        assert!(config.model_path.ends_with("doctor_recommender.mrk"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"classifier": {{"n_estimators": 7, "max_features": "all"}}, "location": {{"limit": 3}}}}"#
        )
        .unwrap();

        let config = MedirankConfig::from_file(file.path()).unwrap();
        assert_eq!(config.classifier.n_estimators, 7);
        assert_eq!(config.classifier.max_features, MaxFeatures::All);
        assert_eq!(config.classifier.random_seed, 42);
        assert_eq!(config.location.limit, 3);
        assert_eq!(config.location.max_distance_km, 20.0);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"classifer": {{}}}}"#).unwrap();

        let err = MedirankConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, MedirankError::Config(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = MedirankConfig::default();
        config.classifier.n_estimators = 0;
        assert!(config.validate().is_err());

        let mut config = MedirankConfig::default();
        config.location.max_distance_km = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_forest_params_resolve_threads() {
        let params = ClassifierConfig::default().with_seed(9).forest_params();
        assert_eq!(params.seed, 9);
        assert!(params.n_jobs.unwrap_or(0) >= 1);
    }
}
