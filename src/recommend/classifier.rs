//! Condition-driven doctor recommendations from a trained classifier.
//!
//! Training learns, for every doctor, the probability of treating each
//! condition tag seen in the batch. A query selects every tag containing the
//! normalized query text, and doctors are ranked by their mean probability
//! over those tags.
//!
//! ```no_run
//! use medirank::recommend::classifier::ConditionRecommender;
//! use serde_json::json;
//!
//! let recommender = ConditionRecommender::default();
//! recommender.fit(&[
//!     json!({"id": 1, "specialization": "Neurology", "experience_years": 12,
//!            "conditions_treated": ["Migraine", "Epilepsy"]}),
//!     json!({"id": 2, "specialization": "Dermatology", "experience_years": 4,
//!            "conditions_treated": ["Acne"]}),
//! ]).unwrap();
//!
//! for hit in recommender.recommend("migraines", None, 10, 1) {
//!     println!("{} {:.3} {:?}", hit.doctor.id, hit.relevance_score, hit.matched_conditions);
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use ahash::AHashSet;
use serde::Serialize;
use serde_json::Value;

use crate::analysis::TextNormalizer;
use crate::config::ClassifierConfig;
use crate::entity::DoctorRecord;
use crate::error::{MedirankError, Result};
use crate::ml::MLError;
use crate::ml::artifact::ModelArtifact;
use crate::ml::forest::RandomForest;
use crate::ml::labels::MultiLabelBinarizer;
use crate::ml::scaler::FeatureTransformer;
use crate::preprocess::{expand_specialty_conditions, preprocess_doctor_batch};
use crate::recommend::holder::ModelHolder;

/// A recommended doctor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub doctor: DoctorRecord,
    /// Mean probability over the matched labels.
    pub relevance_score: f64,
    /// Matched labels this doctor actually lists, in label order.
    pub matched_conditions: Vec<String>,
}

/// Classifier-based recommender.
///
/// Untrained until [`fit`](Self::fit) or [`load`](Self::load) succeeds.
/// Both build the new model before swapping it in, so concurrent
/// [`recommend`](Self::recommend) calls see either the old or the new model.
#[derive(Debug)]
pub struct ConditionRecommender {
    config: ClassifierConfig,
    expand_conditions: bool,
    normalizer: Arc<TextNormalizer>,
    model: ModelHolder<ModelArtifact>,
}

impl Default for ConditionRecommender {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl ConditionRecommender {
    pub fn new(config: ClassifierConfig) -> Self {
        ConditionRecommender {
            config,
            expand_conditions: false,
            normalizer: TextNormalizer::shared(),
            model: ModelHolder::new(),
        }
    }

    /// Add each doctor's specialty catalog conditions before training.
    pub fn with_specialty_expansion(mut self, enabled: bool) -> Self {
        self.expand_conditions = enabled;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_loaded()
    }

    /// The current model, if any.
    pub fn model(&self) -> Option<Arc<ModelArtifact>> {
        self.model.current()
    }

    /// Train on raw doctor records, replacing any current model.
    ///
    /// Records that fail preprocessing are dropped. Training fails when no
    /// record survives or no record lists a condition; the previous model,
    /// if any, is kept in that case.
    pub fn fit(&self, records: &[Value]) -> Result<()> {
        let doctors = preprocess_doctor_batch(records);
        self.fit_records(doctors)
    }

    /// Train on preprocessed doctor records.
    pub fn fit_records(&self, mut doctors: Vec<DoctorRecord>) -> Result<()> {
        for doctor in doctors.iter_mut() {
            if self.expand_conditions {
                expand_specialty_conditions(doctor);
            }
            doctor.conditions_treated = self.normalizer.normalize_tags(&doctor.conditions_treated);
        }

        let result = self.model.rebuild(|| {
            self.build_artifact(doctors).map_err(|e| {
                if e.is_training_failure() {
                    e
                } else {
                    MedirankError::training(e.to_string())
                }
            })
        });

        match result {
            Ok(artifact) => {
                tracing::info!(
                    "trained condition classifier: {} doctors, {} labels, {} trees",
                    artifact.len(),
                    artifact.labels.len(),
                    artifact.classifier.n_estimators()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("training failed: {e}");
                Err(e)
            }
        }
    }

    fn build_artifact(&self, doctors: Vec<DoctorRecord>) -> Result<ModelArtifact> {
        if doctors.is_empty() {
            return Err(MedirankError::training("no valid doctor records"));
        }

        let tag_sets: Vec<Vec<String>> = doctors.iter().map(|d| d.conditions_treated.clone()).collect();
        let labels = MultiLabelBinarizer::fit(&tag_sets);
        if labels.is_empty() {
            return Err(MedirankError::training("no condition tags in the training batch"));
        }

        let transformer = FeatureTransformer::fit(
            &doctors,
            &self.config.numeric_features,
            &self.config.categorical_features,
        )?;
        let features = transformer.transform_all(&doctors)?;
        let targets = labels.transform_all(&tag_sets);
        let classifier = RandomForest::fit(&features, &targets, &self.config.forest_params())?;

        ModelArtifact::new(
            self.config.n_estimators,
            self.config.random_seed,
            self.config.numeric_features.clone(),
            self.config.categorical_features.clone(),
            classifier,
            transformer,
            labels,
            doctors,
        )
    }

    /// Rank doctors for a condition query.
    ///
    /// Returns an empty list when untrained or when no label contains the
    /// normalized query. `page` starts at 1; `page` 0 is treated as 1.
    pub fn recommend(
        &self,
        query: &str,
        specialization: Option<&str>,
        limit: usize,
        page: usize,
    ) -> Vec<Recommendation> {
        let Some(model) = self.model.current() else {
            tracing::debug!("recommend called before the classifier was trained");
            return Vec::new();
        };

        let normalized = self.normalizer.normalize(query);
        let matched: Vec<usize> = model
            .labels
            .classes()
            .iter()
            .enumerate()
            .filter(|(_, class)| class.contains(normalized.as_str()))
            .map(|(i, _)| i)
            .collect();

        tracing::debug!("query {normalized:?} matched {} labels", matched.len());
        if matched.is_empty() {
            return Vec::new();
        }

        let scores: Vec<f64> = (0..model.len())
            .map(|row| {
                model.probabilities(row).map_or(0.0, |p| {
                    matched.iter().map(|&i| p[i]).sum::<f64>() / matched.len() as f64
                })
            })
            .collect();

        let mut order: Vec<usize> = (0..model.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let specialization = specialization
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let start = page.max(1).saturating_sub(1).saturating_mul(limit);

        order
            .into_iter()
            .filter(|&row| {
                specialization
                    .as_ref()
                    .is_none_or(|s| model.doctors[row].specialization == *s)
            })
            .skip(start)
            .take(limit)
            .map(|row| {
                let doctor = model.doctors[row].clone();
                let own: AHashSet<&str> = doctor.conditions_treated.iter().map(String::as_str).collect();
                let matched_conditions = matched
                    .iter()
                    .map(|&i| model.labels.classes()[i].as_str())
                    .filter(|class| own.contains(class))
                    .map(str::to_string)
                    .collect();

                Recommendation {
                    relevance_score: scores[row],
                    matched_conditions,
                    doctor,
                }
            })
            .collect()
    }

    /// Persist the current model.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let model = self.model.current().ok_or_else(|| MLError::ModelNotTrained {
            message: "nothing to save".to_string(),
        })?;
        model.save(path).inspect_err(|e| tracing::error!("{e}"))
    }

    /// Load a persisted model, replacing the current one on success.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.model
            .rebuild(|| ModelArtifact::load(path))
            .map(|_| ())
            .inspect_err(|e| tracing::error!("{e}"))
    }

    /// Construct a recommender straight from a persisted model.
    pub fn from_file<P: AsRef<Path>>(path: P, config: ClassifierConfig) -> Result<Self> {
        let recommender = Self::new(config);
        recommender.load(path)?;
        Ok(recommender)
    }
}
