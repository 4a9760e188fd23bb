//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{MedirankArgs, OutputFormat};
use crate::error::Result;

/// Result structure for training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingResult {
    pub model_path: String,
    pub records_read: usize,
    pub doctors: usize,
    pub labels: usize,
    pub trees: usize,
    pub duration_ms: u64,
}

/// Result structure for condition recommendations.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResults {
    pub query: String,
    pub page: usize,
    /// True when the hits come from the keyword fallback.
    pub fallback: bool,
    pub hits: Vec<Value>,
    pub duration_ms: u64,
}

/// Result structure for location ranking.
#[derive(Debug, Serialize, Deserialize)]
pub struct NearbyResults {
    pub kind: String,
    pub candidates: usize,
    pub hits: Vec<Value>,
    pub duration_ms: u64,
}

/// Result structure for text normalization.
#[derive(Debug, Serialize, Deserialize)]
pub struct NormalizationResult {
    pub input: String,
    pub normalized: String,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &MedirankArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &MedirankArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    match value.get("hits").and_then(Value::as_array) {
        Some(hits) => output_hits_human(&value, hits),
        None => output_generic_human(&value),
    }
    Ok(())
}

/// Output a ranked hit list in human format.
fn output_hits_human(value: &Value, hits: &[Value]) {
    if hits.is_empty() {
        println!("No results.");
    }

    for (i, hit) in hits.iter().enumerate() {
        let name = hit.get("name").and_then(Value::as_str).unwrap_or("(unnamed)");
        let id = hit.get("id").map(format_value).unwrap_or_default();
        println!("{}. {name} [{id}]", i + 1);

        if let Some(score) = hit.get("relevance_score").and_then(Value::as_f64) {
            println!("   score: {score:.3}");
        }
        if let Some(distance) = hit.get("distance_km").and_then(Value::as_f64) {
            println!("   distance: {distance:.2} km");
        }
        if let Some(specialization) = hit.get("specialization").and_then(Value::as_str)
            && !specialization.is_empty()
        {
            println!("   specialization: {specialization}");
        }
        if let Some(matched) = hit.get("matched_conditions").and_then(Value::as_array)
            && !matched.is_empty()
        {
            println!("   matched: {}", format_list(matched));
        }
    }

    println!();
    if value.get("fallback").and_then(Value::as_bool) == Some(true) {
        println!("No condition matched the query; showing keyword matches.");
    }
    if let Some(candidates) = value.get("candidates").and_then(Value::as_u64) {
        println!("Candidates loaded: {candidates}");
    }
    if let Some(duration) = value.get("duration_ms").and_then(Value::as_u64) {
        println!("Time: {duration}ms");
    }
}

/// Output generic data in human format.
fn output_generic_human(value: &Value) {
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                println!("{key}: {}", format_value(val));
            }
        }
        _ => println!("{}", format_value(value)),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &MedirankArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => format!("[{}]", format_list(arr)),
        Value::Object(_) => "[object]".to_string(),
        Value::Null => "null".to_string(),
    }
}

fn format_list(values: &[Value]) -> String {
    values.iter().map(format_value).collect::<Vec<_>>().join(", ")
}
