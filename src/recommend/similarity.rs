//! Query-to-entity similarity for location ranking.
//!
//! Every entity kind is scored with the same weighted sum:
//!
//! ```text
//! 0.3 · [query ⊂ specialization]
//! + 0.3 · [query ⊂ any treated condition]
//! + 0.2 · capacity score
//! + 0.2 · quality score
//! ```
//!
//! What "capacity" and "quality" mean is up to the [`SimilarityScorer`] for
//! the kind: years of experience and rating for doctors, free beds and staff
//! size for hospitals. Both scores are clamped to `[0, 1]`, so similarity is
//! always in `[0, 1]`.

use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;

use crate::analysis::TextNormalizer;
use crate::entity::{EntityKind, RawRecord, number_field, string_field, tags_field};
use crate::error::Result;

pub const SPECIALIZATION_WEIGHT: f64 = 0.3;
pub const CONDITION_WEIGHT: f64 = 0.3;
pub const CAPACITY_WEIGHT: f64 = 0.2;
pub const QUALITY_WEIGHT: f64 = 0.2;

/// Normalized view of an entity used for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemProfile {
    /// Normalized specialization.
    pub specialization: String,
    /// Normalized condition or disease tags.
    pub conditions: Vec<String>,
    /// Raw capacity signal (experience years, available beds).
    pub capacity: f64,
    /// Raw quality signal (rating, doctor count).
    pub quality: f64,
}

/// Scores how well an entity of one kind matches a normalized query.
pub trait SimilarityScorer: Send + Sync + Debug {
    /// The entity kind this scorer understands.
    fn kind(&self) -> EntityKind;

    /// Build the scoring profile for a raw record.
    fn profile(&self, record: &RawRecord, normalizer: &TextNormalizer) -> Result<ItemProfile>;

    /// Capacity and quality scores, each in `[0, 1]`.
    fn signal_scores(&self, profile: &ItemProfile) -> (f64, f64);

    /// Similarity in `[0, 1]` of a profile to an already-normalized query.
    /// An empty query makes every item equally relevant.
    fn similarity(&self, profile: &ItemProfile, query: &str) -> f64 {
        if query.is_empty() {
            return 1.0;
        }

        let specialization_match = profile.specialization.contains(query);
        let condition_match = profile.conditions.iter().any(|c| c.contains(query));
        let (capacity, quality) = self.signal_scores(profile);

        SPECIALIZATION_WEIGHT * f64::from(u8::from(specialization_match))
            + CONDITION_WEIGHT * f64::from(u8::from(condition_match))
            + CAPACITY_WEIGHT * capacity
            + QUALITY_WEIGHT * quality
    }
}

/// Built-in scorer for an entity kind.
pub fn scorer_for(kind: EntityKind) -> Arc<dyn SimilarityScorer> {
    match kind {
        EntityKind::Doctor => Arc::new(DoctorSimilarity::default()),
        EntityKind::Hospital => Arc::new(HospitalSimilarity::default()),
    }
}

/// Doctors: experience capped at 20 years, rating on a five-star scale.
#[derive(Debug, Clone)]
pub struct DoctorSimilarity {
    pub experience_cap_years: f64,
    pub max_rating: f64,
}

impl Default for DoctorSimilarity {
    fn default() -> Self {
        DoctorSimilarity {
            experience_cap_years: 20.0,
            max_rating: 5.0,
        }
    }
}

impl SimilarityScorer for DoctorSimilarity {
    fn kind(&self) -> EntityKind {
        EntityKind::Doctor
    }

    fn profile(&self, record: &RawRecord, normalizer: &TextNormalizer) -> Result<ItemProfile> {
        common_profile(
            record,
            normalizer,
            EntityKind::Doctor,
            number_field(record, "experience_years")?.unwrap_or(0.0),
            number_field(record, "rating")?.unwrap_or(0.0),
        )
    }

    fn signal_scores(&self, profile: &ItemProfile) -> (f64, f64) {
        (
            unit(profile.capacity / self.experience_cap_years),
            unit(profile.quality / self.max_rating),
        )
    }
}

/// Hospitals: beds capped at 100, staff capped at 20 doctors.
#[derive(Debug, Clone)]
pub struct HospitalSimilarity {
    pub bed_cap: f64,
    pub doctor_cap: f64,
}

impl Default for HospitalSimilarity {
    fn default() -> Self {
        HospitalSimilarity {
            bed_cap: 100.0,
            doctor_cap: 20.0,
        }
    }
}

impl SimilarityScorer for HospitalSimilarity {
    fn kind(&self) -> EntityKind {
        EntityKind::Hospital
    }

    fn profile(&self, record: &RawRecord, normalizer: &TextNormalizer) -> Result<ItemProfile> {
        let doctor_count = match number_field(record, "doctor_count")? {
            Some(count) => count,
            None => record
                .get("doctors")
                .and_then(Value::as_array)
                .map_or(0.0, |doctors| doctors.len() as f64),
        };

        common_profile(
            record,
            normalizer,
            EntityKind::Hospital,
            number_field(record, "available_beds")?.unwrap_or(0.0),
            doctor_count,
        )
    }

    fn signal_scores(&self, profile: &ItemProfile) -> (f64, f64) {
        (
            unit(profile.capacity / self.bed_cap),
            unit(profile.quality / self.doctor_cap),
        )
    }
}

fn common_profile(
    record: &RawRecord,
    normalizer: &TextNormalizer,
    kind: EntityKind,
    capacity: f64,
    quality: f64,
) -> Result<ItemProfile> {
    let specialization = string_field(record, "specialization")?.unwrap_or_default();
    let tags = tags_field(record, kind.conditions_field());

    Ok(ItemProfile {
        specialization: normalizer.normalize(&specialization),
        conditions: normalizer.normalize_tags(&tags),
        capacity,
        quality,
    })
}

fn unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_doctor_profile_and_similarity() {
        let normalizer = TextNormalizer::new();
        let scorer = DoctorSimilarity::default();
        let profile = scorer
            .profile(
                &record(json!({
                    "specialization": "Cardiology",
                    "conditions_treated": ["Heart Diseases", "Hypertension"],
                    "experience_years": 30,
                    "rating": 4.0,
                })),
                &normalizer,
            )
            .unwrap();

        assert_eq!(profile.specialization, "cardiology");
        assert_eq!(profile.conditions, vec!["heart disease", "hypertension"]);

        // 0.3 * 0 + 0.3 * 1 + 0.2 * 1.0 + 0.2 * 0.8
        let s = scorer.similarity(&profile, "heart");
        assert!((s - 0.66).abs() < 1e-12, "{s}");

        // 0.3 * 1 + 0.3 * 0 + 0.2 + 0.16
        let s = scorer.similarity(&profile, "cardiology");
        assert!((s - 0.66).abs() < 1e-12, "{s}");

        assert_eq!(scorer.similarity(&profile, ""), 1.0);
    }

    #[test]
    fn test_doctor_missing_signals_score_zero() {
        let normalizer = TextNormalizer::new();
        let scorer = DoctorSimilarity::default();
        let profile = scorer.profile(&record(json!({"name": "Dr. X"})), &normalizer).unwrap();

        assert_eq!(scorer.signal_scores(&profile), (0.0, 0.0));
        assert_eq!(scorer.similarity(&profile, "acne"), 0.0);
    }

    #[test]
    fn test_rating_above_scale_is_clamped() {
        let scorer = DoctorSimilarity::default();
        let profile = ItemProfile {
            specialization: String::new(),
            conditions: Vec::new(),
            capacity: -4.0,
            quality: 9.0,
        };
        assert_eq!(scorer.signal_scores(&profile), (0.0, 1.0));
    }

    #[test]
    fn test_hospital_profile() {
        let normalizer = TextNormalizer::new();
        let scorer = HospitalSimilarity::default();
        let profile = scorer
            .profile(
                &record(json!({
                    "specialization": "Multi-specialty",
                    "diseases_treated": "Fractures, Burns",
                    "available_beds": 50,
                    "doctors": [{}, {}, {}, {}, {}],
                })),
                &normalizer,
            )
            .unwrap();

        assert_eq!(profile.conditions, vec!["fracture", "burn"]);
        assert_eq!(scorer.signal_scores(&profile), (0.5, 0.25));

        // 0.3 * 0 + 0.3 * 1 + 0.2 * 0.5 + 0.2 * 0.25
        let s = scorer.similarity(&profile, "burn");
        assert!((s - 0.45).abs() < 1e-12, "{s}");
    }

    #[test]
    fn test_bad_numeric_field_is_an_error() {
        let normalizer = TextNormalizer::new();
        let scorer = HospitalSimilarity::default();
        assert!(scorer
            .profile(&record(json!({"available_beds": "plenty"})), &normalizer)
            .is_err());
    }

    #[test]
    fn test_scorer_for_kind() {
        assert_eq!(scorer_for(EntityKind::Doctor).kind(), EntityKind::Doctor);
        assert_eq!(scorer_for(EntityKind::Hospital).kind(), EntityKind::Hospital);
    }
}
