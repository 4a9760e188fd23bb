use std::fs;

use serde_json::json;
use tempfile::TempDir;

use medirank::config::ClassifierConfig;
use medirank::error::Result;
use medirank::ml::artifact::{FORMAT_VERSION, ModelArtifact, decode_envelope, encode_envelope};
use medirank::recommend::ConditionRecommender;

fn trained() -> Result<ConditionRecommender> {
    let recommender = ConditionRecommender::new(ClassifierConfig::default().with_estimators(10));
    recommender.fit(&[
        json!({"id": 1, "specialization": "Endocrinology", "experience_years": 12, "rating": 4.4,
               "conditions_treated": ["Diabetes", "Thyroid Disorders"]}),
        json!({"id": 2, "specialization": "Psychiatry", "experience_years": 7, "rating": 4.0,
               "conditions_treated": ["Depression", "Anxiety Disorders"]}),
        json!({"id": 3, "specialization": "Endocrinology", "experience_years": 2,
               "conditions_treated": ["Diabetes"]}),
    ])?;
    Ok(recommender)
}

#[test]
fn saved_model_reloads_with_identical_recommendations() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("dir").join("model.mrk");

    let original = trained()?;
    original.save(&path)?;
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reloaded = ConditionRecommender::from_file(&path, ClassifierConfig::default())?;
    for query in ["disorder", "diabetes", "anxiety"] {
        assert_eq!(
            original.recommend(query, None, 10, 1),
            reloaded.recommend(query, None, 10, 1)
        );
    }

    let model = reloaded.model().expect("loaded");
    assert_eq!(model.n_estimators, 10);
    assert_eq!(model.random_seed, 42);
    assert!(model.trained_at.is_some());
    Ok(())
}

#[test]
fn failed_reload_keeps_the_current_model() -> Result<()> {
    let dir = TempDir::new()?;
    let good = dir.path().join("good.mrk");
    let bad = dir.path().join("bad.mrk");

    let recommender = trained()?;
    recommender.save(&good)?;

    let mut bytes = fs::read(&good)?;
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xff;
    fs::write(&bad, &bytes)?;

    let err = recommender.load(&bad).unwrap_err();
    assert!(err.is_load_failure());
    assert_eq!(recommender.model().expect("kept").len(), 3);

    let err = recommender.load(dir.path().join("missing.mrk")).unwrap_err();
    assert!(err.is_load_failure());
    assert!(recommender.is_trained());
    Ok(())
}

#[test]
fn newer_format_versions_are_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("future.mrk");

    let recommender = trained()?;
    let bytes = recommender.model().expect("trained").to_bytes()?;
    let (_, payload) = decode_envelope(&bytes)?;
    fs::write(&path, encode_envelope(FORMAT_VERSION + 1, payload)?)?;

    let err = ModelArtifact::load(&path).unwrap_err();
    assert!(err.is_load_failure());
    assert!(err.to_string().contains("format version"));
    Ok(())
}

#[test]
fn payload_without_hyperparameters_loads_with_defaults() -> Result<()> {
    let recommender = trained()?;
    let bytes = recommender.model().expect("trained").to_bytes()?;
    let (version, payload) = decode_envelope(&bytes)?;

    let mut value: serde_json::Value = serde_json::from_slice(payload)?;
    let object = value.as_object_mut().expect("object payload");
    for key in ["n_estimators", "random_seed", "trained_at"] {
        object.remove(key);
    }
    let stripped = encode_envelope(version, &serde_json::to_vec(&value)?)?;

    let artifact = ModelArtifact::from_bytes(&stripped)?;
    assert_eq!(artifact.n_estimators, 100);
    assert_eq!(artifact.random_seed, 42);
    assert_eq!(artifact.trained_at, None);
    assert_eq!(artifact.len(), 3);
    Ok(())
}
