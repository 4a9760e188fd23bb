//! Command implementations for the medirank CLI.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_json::Value;

use crate::analysis::TextNormalizer;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::MedirankConfig;
use crate::entity::EntityKind;
use crate::error::{MedirankError, Result};
use crate::geo::GeoPoint;
use crate::preprocess::preprocess_doctor_batch;
use crate::recommend::{ConditionRecommender, LocationQuery, LocationRecommender, keyword_search};

/// Execute a CLI command.
pub fn execute_command(args: MedirankArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => MedirankConfig::from_file(path)?,
        None => MedirankConfig::default(),
    };

    match &args.command {
        Command::Train(train_args) => train(train_args, &config, &args),
        Command::Recommend(recommend_args) => recommend(recommend_args, &config, &args),
        Command::Nearby(nearby_args) => nearby(nearby_args, &config, &args),
        Command::Normalize(normalize_args) => normalize(normalize_args, &args),
    }
}

/// Train the classifier and save it.
fn train(args: &TrainArgs, config: &MedirankConfig, cli_args: &MedirankArgs) -> Result<()> {
    let start_time = Instant::now();
    let records = load_records(&args.records)?;

    let mut classifier_config = config.classifier.clone();
    if let Some(estimators) = args.estimators {
        if estimators == 0 {
            return Err(MedirankError::invalid_argument("--estimators must be at least 1"));
        }
        classifier_config = classifier_config.with_estimators(estimators);
    }
    if let Some(seed) = args.seed {
        classifier_config = classifier_config.with_seed(seed);
    }

    let recommender = ConditionRecommender::new(classifier_config)
        .with_specialty_expansion(args.expand_conditions || config.expand_specialty_conditions);
    recommender.fit(&records)?;

    let model_path = args.output.as_deref().unwrap_or(&config.model_path);
    recommender.save(model_path)?;

    let model = recommender
        .model()
        .ok_or_else(|| MedirankError::other("model missing after training"))?;

    output_result(
        "Model trained successfully",
        &TrainingResult {
            model_path: model_path.display().to_string(),
            records_read: records.len(),
            doctors: model.len(),
            labels: model.labels.len(),
            trees: model.classifier.n_estimators(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Recommend doctors for a condition query.
fn recommend(args: &RecommendArgs, config: &MedirankConfig, cli_args: &MedirankArgs) -> Result<()> {
    let start_time = Instant::now();
    let model_path = args.model.as_deref().unwrap_or(&config.model_path);
    let recommender = ConditionRecommender::from_file(model_path, config.classifier.clone())?;

    let results = recommender.recommend(
        &args.query,
        args.specialization.as_deref(),
        args.limit,
        args.page,
    );

    let (hits, fallback) = match (&args.fallback_records, results.is_empty()) {
        (Some(path), true) => {
            let doctors = preprocess_doctor_batch(&load_records(path)?);
            let matches = keyword_search(&doctors, &args.query, args.limit);
            let hits = matches
                .into_iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            (hits, true)
        }
        _ => {
            let hits = results
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            (hits, false)
        }
    };

    output_result(
        &format!("Recommendations for \"{}\"", args.query),
        &RecommendationResults {
            query: args.query.clone(),
            page: args.page.max(1),
            fallback,
            hits,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Rank records near a position.
fn nearby(args: &NearbyArgs, config: &MedirankConfig, cli_args: &MedirankArgs) -> Result<()> {
    let start_time = Instant::now();
    let user = GeoPoint::new(args.lat, args.lon)?;
    if let Some(distance) = args.max_distance
        && (distance.is_nan() || distance < 0.0)
    {
        return Err(MedirankError::invalid_argument("--max-distance must be non-negative"));
    }

    let kind = EntityKind::from(args.kind);
    let records = load_records(&args.records)?;
    let recommender = LocationRecommender::new(kind);
    let candidates = recommender.fit(&records);

    let mut query = LocationQuery::new(user.lat, user.lon).with_config(&config.location);
    if let Some(text) = &args.query {
        query = query.with_query(text.as_str());
    }
    if let Some(specialization) = &args.specialization {
        query = query.with_specialization(specialization.as_str());
    }
    if let Some(distance) = args.max_distance {
        query = query.with_max_distance_km(distance);
    }
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }

    let hits = recommender
        .recommend(&query)
        .iter()
        .map(|hit| hit.to_value())
        .collect();

    output_result(
        &format!("{kind}s within {} km", query.max_distance_km),
        &NearbyResults {
            kind: kind.to_string(),
            candidates,
            hits,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Normalize a piece of text.
fn normalize(args: &NormalizeArgs, cli_args: &MedirankArgs) -> Result<()> {
    let normalizer = TextNormalizer::shared();
    output_result(
        "Normalized text",
        &NormalizationResult {
            input: args.text.clone(),
            normalized: normalizer.normalize(&args.text),
        },
        cli_args,
    )
}

/// Read entity records from a JSON array file or a JSON lines file.
///
/// Unparsable lines in a JSON lines file are logged and skipped.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;

    if content.trim_start().starts_with('[') {
        let records: Vec<Value> = serde_json::from_str(&content)
            .map_err(|e| MedirankError::invalid_argument(format!("{}: {e}", path.display())))?;
        return Ok(records);
    }

    let mut records = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("{}:{}: skipping unparsable record: {e}", path.display(), line_num + 1),
        }
    }
    Ok(records)
}
