//! Location-weighted ranking.
//!
//! Items within the search radius are ranked by
//!
//! ```text
//! final = 0.7 · similarity + 0.3 · 1 / (1 + distance_km)
//! ```
//!
//! where similarity comes from the recommender's [`SimilarityScorer`]. Items
//! without resolvable coordinates never appear in results.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::analysis::TextNormalizer;
use crate::config::LocationConfig;
use crate::entity::{EntityKind, RawRecord, as_record, coordinates, describe};
use crate::error::Result;
use crate::geo::GeoPoint;
use crate::recommend::holder::ModelHolder;
use crate::recommend::similarity::{ItemProfile, SimilarityScorer, scorer_for};

pub const RELEVANCE_WEIGHT: f64 = 0.7;
pub const PROXIMITY_WEIGHT: f64 = 0.3;

/// Proximity score in `(0, 1]`, equal to 1 at distance 0.
pub fn distance_score(distance_km: f64) -> f64 {
    1.0 / (1.0 + distance_km)
}

/// Blend of relevance and proximity used for ordering.
pub fn final_score(similarity: f64, distance_km: f64) -> f64 {
    RELEVANCE_WEIGHT * similarity + PROXIMITY_WEIGHT * distance_score(distance_km)
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}

/// An item loaded for location ranking.
#[derive(Debug, Clone)]
pub struct LocatedItem {
    /// The record exactly as supplied.
    pub record: RawRecord,
    pub location: Option<GeoPoint>,
    pub profile: ItemProfile,
}

/// Parameters of one location query.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationQuery {
    pub user: GeoPoint,
    pub query: Option<String>,
    /// Merged into the query text as a relevance boost, not a filter.
    pub specialization: Option<String>,
    pub max_distance_km: f64,
    pub limit: usize,
}

impl LocationQuery {
    /// Query around a user position with default radius and limit.
    pub fn new(lat: f64, lon: f64) -> Self {
        let defaults = LocationConfig::default();
        LocationQuery {
            user: GeoPoint::unchecked(lat, lon),
            query: None,
            specialization: None,
            max_distance_km: defaults.max_distance_km,
            limit: defaults.limit,
        }
    }

    pub fn with_query<S: Into<String>>(mut self, query: S) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_specialization<S: Into<String>>(mut self, specialization: S) -> Self {
        self.specialization = Some(specialization.into());
        self
    }

    pub fn with_max_distance_km(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = max_distance_km;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Apply configured radius and limit.
    pub fn with_config(self, config: &LocationConfig) -> Self {
        self.with_max_distance_km(config.max_distance_km)
            .with_limit(config.limit)
    }

    /// Query text with the specialization appended.
    pub fn merged_text(&self) -> String {
        let parts = [self.query.as_deref(), self.specialization.as_deref()];
        parts
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One ranked item: the original record plus its rounded distance and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecommendation {
    #[serde(flatten)]
    pub record: RawRecord,
    /// Distance to the user, rounded to 2 decimals.
    pub distance_km: f64,
    /// Final score, rounded to 3 decimals.
    pub relevance_score: f64,
}

impl LocationRecommendation {
    /// The record as a single JSON object with the annotations added.
    pub fn to_value(&self) -> Value {
        let mut record = self.record.clone();
        record.insert("distance_km".to_string(), Value::from(self.distance_km));
        record.insert("relevance_score".to_string(), Value::from(self.relevance_score));
        Value::Object(record)
    }
}

/// Ranks a loaded item set by relevance and proximity.
#[derive(Debug)]
pub struct LocationRecommender {
    scorer: Arc<dyn SimilarityScorer>,
    normalizer: Arc<TextNormalizer>,
    items: ModelHolder<Vec<LocatedItem>>,
}

impl LocationRecommender {
    /// Recommender using the built-in scorer for `kind`.
    pub fn new(kind: EntityKind) -> Self {
        Self::with_scorer(scorer_for(kind))
    }

    /// Recommender for doctors.
    pub fn doctors() -> Self {
        Self::new(EntityKind::Doctor)
    }

    /// Recommender for hospitals.
    pub fn hospitals() -> Self {
        Self::new(EntityKind::Hospital)
    }

    /// Recommender with a custom scorer.
    pub fn with_scorer(scorer: Arc<dyn SimilarityScorer>) -> Self {
        LocationRecommender {
            scorer,
            normalizer: TextNormalizer::shared(),
            items: ModelHolder::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.scorer.kind()
    }

    /// Replace the item set. Records that are not objects or carry malformed
    /// scoring fields are logged and skipped. Returns the number of items
    /// loaded.
    pub fn fit(&self, records: &[Value]) -> usize {
        let mut items = Vec::with_capacity(records.len());
        for (index, value) in records.iter().enumerate() {
            match self.load_item(value) {
                Ok(item) => items.push(item),
                Err(e) => {
                    let who = value
                        .as_object()
                        .map(describe)
                        .unwrap_or_else(|| format!("#{index}"));
                    tracing::warn!("dropping {} record {who}: {e}", self.kind());
                }
            }
        }

        let located = items.iter().filter(|item| item.location.is_some()).count();
        tracing::info!(
            "loaded {} {} records for location ranking ({located} with coordinates)",
            items.len(),
            self.kind()
        );

        let count = items.len();
        self.items.replace(items);
        count
    }

    fn load_item(&self, value: &Value) -> Result<LocatedItem> {
        let record = as_record(value)?;
        Ok(LocatedItem {
            profile: self.scorer.profile(record, &self.normalizer)?,
            location: coordinates(record),
            record: record.clone(),
        })
    }

    /// Number of loaded items.
    pub fn len(&self) -> usize {
        self.items.current().map_or(0, |items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rank loaded items for a query. Ties keep load order.
    pub fn recommend(&self, query: &LocationQuery) -> Vec<LocationRecommendation> {
        let Some(items) = self.items.current() else {
            tracing::debug!("location recommender has no items loaded");
            return Vec::new();
        };

        let text = self.normalizer.normalize(&query.merged_text());

        let mut scored: Vec<(f64, f64, usize)> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let distance = query.user.distance_to(&item.location?);
                // Written so a NaN distance is excluded too.
                if !(distance <= query.max_distance_km) {
                    return None;
                }
                let similarity = self.scorer.similarity(&item.profile, &text);
                Some((final_score(similarity, distance), distance, index))
            })
            .collect();

        tracing::debug!(
            "{} of {} items within {} km for query {text:?}",
            scored.len(),
            items.len(),
            query.max_distance_km
        );

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(query.limit);

        scored
            .into_iter()
            .map(|(score, distance, index)| {
                let mut record = items[index].record.clone();
                record.remove("distance_km");
                record.remove("relevance_score");
                LocationRecommendation {
                    record,
                    distance_km: round_to(distance, 2),
                    relevance_score: round_to(score, 3),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::distance_km;
    use serde_json::json;

    // One degree of latitude is about 111.19 km.
    const KM_PER_DEGREE: f64 = 111.194_926_644_558_73;

    fn north_of(lat: f64, km: f64) -> f64 {
        lat + km / KM_PER_DEGREE
    }

    #[test]
    fn test_scores() {
        assert_eq!(distance_score(0.0), 1.0);
        assert_eq!(distance_score(1.0), 0.5);
        assert_eq!(final_score(1.0, 0.0), 1.0);
        assert!((final_score(0.0, 3.0) - 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_merged_text() {
        let q = LocationQuery::new(0.0, 0.0).with_query(" knee pain ").with_specialization("Orthopedics");
        assert_eq!(q.merged_text(), "knee pain Orthopedics");

        let q = LocationQuery::new(0.0, 0.0).with_specialization("Orthopedics");
        assert_eq!(q.merged_text(), "Orthopedics");

        assert_eq!(LocationQuery::new(0.0, 0.0).with_query("").merged_text(), "");
    }

    #[test]
    fn test_radius_and_missing_coordinates() {
        let recommender = LocationRecommender::doctors();
        let loaded = recommender.fit(&[
            json!({"id": 1, "latitude": north_of(12.0, 5.0), "longitude": 77.0}),
            json!({"id": 2, "latitude": north_of(12.0, 25.0), "longitude": 77.0}),
            json!({"id": 3, "name": "no coordinates"}),
            json!("garbage"),
        ]);
        assert_eq!(loaded, 3);

        let results = recommender.recommend(&LocationQuery::new(12.0, 77.0));
        let ids: Vec<&Value> = results.iter().map(|r| &r.record["id"]).collect();
        assert_eq!(ids, vec![&json!(1)]);
        assert!((results[0].distance_km - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_ties_keep_load_order_and_limit_applies() {
        let recommender = LocationRecommender::hospitals();
        let same = json!({"latitude": 10.0, "longitude": 10.0});
        let records: Vec<Value> = (0..5)
            .map(|i| {
                let mut r = same.clone();
                r["id"] = json!(i);
                r
            })
            .collect();
        recommender.fit(&records);

        let results = recommender.recommend(&LocationQuery::new(10.0, 10.0).with_limit(3));
        let ids: Vec<i64> = results.iter().map(|r| r.record["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(results[0].relevance_score, 1.0);
        assert_eq!(results[0].distance_km, 0.0);
    }

    #[test]
    fn test_relevance_outranks_small_distance_gap() {
        let recommender = LocationRecommender::doctors();
        recommender.fit(&[
            json!({
                "id": "near", "specialization": "Dermatology", "conditions_treated": ["Acne"],
                "experience_years": 5, "rating": 4.0,
                "latitude": north_of(0.0, 1.0), "longitude": 0.0,
            }),
            json!({
                "id": "far", "specialization": "Cardiology", "conditions_treated": ["Hypertension"],
                "experience_years": 5, "rating": 4.0,
                "latitude": north_of(0.0, 3.0), "longitude": 0.0,
            }),
        ]);

        let results = recommender.recommend(&LocationQuery::new(0.0, 0.0).with_query("hypertension"));
        assert_eq!(results[0].record["id"], json!("far"));
        assert_eq!(results[1].record["id"], json!("near"));
        assert!(results[0].relevance_score > results[1].relevance_score);
    }

    #[test]
    fn test_output_keeps_raw_fields() {
        let recommender = LocationRecommender::doctors();
        recommender.fit(&[json!({
            "id": 9,
            "specialization": "Neurology",
            "custom": {"kept": true},
            "distance_km": "stale",
            "latitude": 1.0,
            "longitude": 1.0,
        })]);

        let result = &recommender.recommend(&LocationQuery::new(1.0, 1.0))[0];
        let value = result.to_value();
        assert_eq!(value["specialization"], json!("Neurology"));
        assert_eq!(value["custom"], json!({"kept": true}));
        assert_eq!(value["distance_km"], json!(0.0));

        let serialized = serde_json::to_value(result).unwrap();
        assert_eq!(serialized, value);
    }

    #[test]
    fn test_rounding() {
        let recommender = LocationRecommender::doctors();
        recommender.fit(&[json!({"latitude": 0.0123, "longitude": 0.0456})]);

        let result = &recommender.recommend(&LocationQuery::new(0.0, 0.0))[0];
        let raw = distance_km(0.0, 0.0, 0.0123, 0.0456);
        assert_eq!(result.distance_km, (raw * 100.0).round() / 100.0);
        assert_eq!(result.relevance_score, (final_score(1.0, raw) * 1000.0).round() / 1000.0);
    }

    #[test]
    fn test_unloaded_returns_empty() {
        let recommender = LocationRecommender::doctors();
        assert!(recommender.is_empty());
        assert!(recommender.recommend(&LocationQuery::new(0.0, 0.0)).is_empty());
    }
}
