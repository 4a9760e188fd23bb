use serde_json::{Value, json};

use medirank::config::ClassifierConfig;
use medirank::error::Result;
use medirank::preprocess::preprocess_doctor_batch;
use medirank::recommend::{ConditionRecommender, keyword_search};

fn doctor_records() -> Vec<Value> {
    vec![
        json!({"id": "d1", "name": "Dr. Rao", "specialization": "Orthopedics", "experience_years": 14,
               "rating": 4.6, "patients_treated": 5200, "consultation_fee": 800,
               "conditions_treated": ["Back Pain", "Arthritis", "Joint Pains"]}),
        json!({"id": "d2", "name": "Dr. Iyer", "specialization": "Neurology", "experience_years": 9,
               "rating": 4.2, "patients_treated": 2100, "consultation_fee": 1200,
               "conditions_treated": ["Migraines", "Epilepsy", "Back Pain"]}),
        json!({"id": "d3", "name": "Dr. Khan", "specialization": "Dermatology", "experience_years": 3,
               "rating": 3.8, "consultation_fee_inr": "450",
               "conditions_treated": "Acne, Eczema, Skin Allergies"}),
        json!({"id": "d4", "name": "Dr. Menon", "specialization": "Cardiology", "experience_years": 22,
               "conditions_treated": ["Hypertension", "Heart Diseases"]}),
        json!({"id": "d5", "name": "Dr. Das", "specialization": "Pulmonology",
               "conditions_treated": ["Asthma"]}),
    ]
}

fn config() -> ClassifierConfig {
    ClassifierConfig::default().with_estimators(25).with_seed(7)
}

#[test]
fn record_without_experience_is_dropped_from_the_model() -> Result<()> {
    let recommender = ConditionRecommender::new(config());
    recommender.fit(&doctor_records())?;

    let model = recommender.model().expect("trained");
    assert_eq!(model.len(), doctor_records().len() - 1);
    assert!(model.doctors.iter().all(|d| d.id != json!("d5")));
    assert!(!model.labels.classes().iter().any(|c| c == "asthma"));
    Ok(())
}

#[test]
fn unknown_condition_returns_nothing() -> Result<()> {
    let recommender = ConditionRecommender::new(config());
    recommender.fit(&doctor_records())?;

    assert!(recommender.recommend("zzzznotarealcondition", None, 10, 1).is_empty());
    Ok(())
}

#[test]
fn plural_query_matches_singular_labels() -> Result<()> {
    // Without bootstrap the forest reproduces the training labels exactly.
    let recommender = ConditionRecommender::new(ClassifierConfig {
        bootstrap: false,
        ..config()
    });
    recommender.fit(&doctor_records())?;

    let results = recommender.recommend("Skin Allergies", None, 10, 1);
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].doctor.id, json!("d3"));
    assert_eq!(results[0].relevance_score, 1.0);
    assert_eq!(results[0].matched_conditions, vec!["skin allergy"]);
    for hit in &results[1..] {
        assert_eq!(hit.relevance_score, 0.0);
        assert!(hit.matched_conditions.is_empty());
    }
    Ok(())
}

#[test]
fn scores_are_bounded_and_sorted() -> Result<()> {
    let recommender = ConditionRecommender::new(config());
    recommender.fit(&doctor_records())?;

    let results = recommender.recommend("pain", None, 10, 1);
    assert_eq!(results.len(), 4);
    for pair in results.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }
    for hit in &results {
        assert!((0.0..=1.0).contains(&hit.relevance_score));
    }
    Ok(())
}

#[test]
fn same_seed_gives_identical_rankings() -> Result<()> {
    let first = ConditionRecommender::new(config());
    first.fit(&doctor_records())?;

    let mut threaded = config();
    threaded.n_jobs = Some(1);
    let second = ConditionRecommender::new(threaded);
    second.fit(&doctor_records())?;

    assert_eq!(
        first.recommend("pain", None, 10, 1),
        second.recommend("pain", None, 10, 1)
    );
    Ok(())
}

#[test]
fn pages_partition_the_ranking() -> Result<()> {
    let recommender = ConditionRecommender::new(config());
    recommender.fit(&doctor_records())?;

    let all = recommender.recommend("pain", None, 10, 1);
    let mut paged = Vec::new();
    for page in 1..=4 {
        paged.extend(recommender.recommend("pain", None, 1, page));
    }
    assert_eq!(paged, all);
    assert!(recommender.recommend("pain", None, 1, 5).is_empty());
    Ok(())
}

#[test]
fn keyword_fallback_finds_what_the_classifier_cannot() {
    let doctors = preprocess_doctor_batch(&doctor_records());
    let hits = keyword_search(&doctors, "derma", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, json!("d3"));
    assert_eq!(hits[0].consultation_fee, 450.0);
}
