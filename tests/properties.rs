use proptest::prelude::*;
use serde_json::{Value, json};

use medirank::analysis::TextNormalizer;
use medirank::geo::distance_km;
use medirank::recommend::location::final_score;
use medirank::recommend::similarity::{DoctorSimilarity, HospitalSimilarity, ItemProfile, SimilarityScorer};
use medirank::recommend::{LocationQuery, LocationRecommender};

fn latitude() -> impl Strategy<Value = f64> {
    -90.0..=90.0f64
}

fn longitude() -> impl Strategy<Value = f64> {
    -180.0..=180.0f64
}

fn profile() -> impl Strategy<Value = ItemProfile> {
    (
        "[a-z ]{0,12}",
        prop::collection::vec("[a-z ]{1,10}", 0..4),
        -10.0..500.0f64,
        -10.0..50.0f64,
    )
        .prop_map(|(specialization, conditions, capacity, quality)| ItemProfile {
            specialization,
            conditions,
            capacity,
            quality,
        })
}

proptest! {
    #[test]
    fn normalization_is_idempotent(text in "[A-Za-z0-9 ,.'()-]{0,40}") {
        let normalizer = TextNormalizer::new();
        let once = normalizer.normalize(&text);
        prop_assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn normalized_text_is_lowercase(text in "[A-Za-z\u{c0}-\u{ff}0-9 ]{0,30}") {
        let normalized = TextNormalizer::new().normalize(&text);
        prop_assert_eq!(normalized.to_lowercase(), normalized);
    }

    #[test]
    fn distance_is_symmetric_and_non_negative(
        lat1 in latitude(), lon1 in longitude(), lat2 in latitude(), lon2 in longitude()
    ) {
        let d = distance_km(lat1, lon1, lat2, lon2);
        prop_assert!(d >= 0.0);
        prop_assert_eq!(d, distance_km(lat2, lon2, lat1, lon1));
        prop_assert_eq!(distance_km(lat1, lon1, lat1, lon1), 0.0);
    }

    #[test]
    fn similarity_is_bounded(profile in profile(), query in "[a-z ]{0,8}") {
        let doctor = DoctorSimilarity::default().similarity(&profile, &query);
        let hospital = HospitalSimilarity::default().similarity(&profile, &query);
        prop_assert!((0.0..=1.0).contains(&doctor));
        prop_assert!((0.0..=1.0).contains(&hospital));
    }

    #[test]
    fn final_score_is_bounded(similarity in 0.0..=1.0f64, distance in 0.0..20_000.0f64) {
        let score = final_score(similarity, distance);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn results_respect_radius_and_order(
        offsets in prop::collection::vec((-0.5..0.5f64, -0.5..0.5f64), 1..20),
        radius in 0.0..60.0f64,
        query in prop::option::of("[a-z]{0,6}"),
    ) {
        let (lat, lon) = (19.076, 72.8777);
        let records: Vec<Value> = offsets
            .iter()
            .enumerate()
            .map(|(i, (dlat, dlon))| json!({
                "id": i,
                "specialization": if i % 2 == 0 { "cardiology" } else { "neurology" },
                "conditions_treated": ["migraine", "hypertension"],
                "experience_years": i,
                "rating": 4.0,
                "latitude": lat + dlat,
                "longitude": lon + dlon,
            }))
            .collect();

        let recommender = LocationRecommender::doctors();
        recommender.fit(&records);

        let mut request = LocationQuery::new(lat, lon).with_max_distance_km(radius).with_limit(records.len());
        if let Some(text) = query {
            request = request.with_query(text);
        }
        let results = recommender.recommend(&request);
        prop_assert_eq!(&recommender.recommend(&request), &results);

        for hit in &results {
            let i = hit.record["id"].as_u64().unwrap() as usize;
            let (dlat, dlon) = offsets[i];
            prop_assert!(distance_km(lat, lon, lat + dlat, lon + dlon) <= radius);
            prop_assert!((0.0..=1.0).contains(&hit.relevance_score));
        }
        for pair in results.windows(2) {
            prop_assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }

        let inside = offsets
            .iter()
            .filter(|(dlat, dlon)| distance_km(lat, lon, lat + dlat, lon + dlon) <= radius)
            .count();
        prop_assert_eq!(results.len(), inside);
    }
}
