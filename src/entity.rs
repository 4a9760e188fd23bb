//! Entity records consumed by the recommenders.
//!
//! Records arrive from storage as loosely typed JSON objects ([`RawRecord`]).
//! The helpers here read single fields out of such an object with the
//! coercions storage layers actually produce: numbers may be JSON numbers or
//! numeric strings (decimal columns), identifiers may be numbers or strings,
//! and a doctor's coordinates may live on a nested `hospital` object.
//!
//! [`DoctorRecord`] and [`HospitalRecord`] are the normalized, typed forms
//! built by [`crate::preprocess`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MedirankError, Result};
use crate::geo::GeoPoint;

/// A loosely typed entity record as fetched from storage.
pub type RawRecord = Map<String, Value>;

/// The two entity kinds the recommenders understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Doctor,
    Hospital,
}

impl EntityKind {
    /// Name of the field holding this kind's treated condition tags.
    pub fn conditions_field(&self) -> &'static str {
        match self {
            EntityKind::Doctor => "conditions_treated",
            EntityKind::Hospital => "diseases_treated",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Doctor => write!(f, "doctor"),
            EntityKind::Hospital => write!(f, "hospital"),
        }
    }
}

/// A preprocessed doctor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRecord {
    /// Opaque identifier, passed through from storage.
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    /// Lowercased, trimmed specialization.
    pub specialization: String,
    pub experience_years: f64,
    pub rating: f64,
    pub patients_treated: u64,
    pub consultation_fee: f64,
    /// Deduplicated, lowercased, trimmed condition tags.
    #[serde(default)]
    pub conditions_treated: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

/// A preprocessed hospital record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    pub specialization: String,
    #[serde(default)]
    pub diseases_treated: Vec<String>,
    pub available_beds: f64,
    pub doctor_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

/// View a JSON value as a record object.
pub fn as_record(value: &Value) -> Result<&RawRecord> {
    value
        .as_object()
        .ok_or_else(|| MedirankError::invalid_record(format!("expected an object, got {}", type_name(value))))
}

/// Short human-readable description of a record for log lines.
pub fn describe(record: &RawRecord) -> String {
    match (record.get("id"), record.get("name").and_then(Value::as_str)) {
        (Some(id), Some(name)) if !id.is_null() => format!("{id} ({name})"),
        (Some(id), _) if !id.is_null() => id.to_string(),
        (_, Some(name)) => name.to_string(),
        _ => "<anonymous>".to_string(),
    }
}

/// Read a numeric field.
///
/// Absent and `null` fields are `Ok(None)`. Numbers and numeric strings are
/// accepted; any other type, or a non-finite value, is an error.
pub fn number_field(record: &RawRecord, key: &str) -> Result<Option<f64>> {
    let Some(value) = record.get(key) else {
        return Ok(None);
    };

    let number = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => Ok(Some(n)),
        Some(n) => Err(MedirankError::invalid_record(format!("field `{key}` is not finite: {n}"))),
        None => Err(MedirankError::invalid_record(format!(
            "field `{key}` is not a number: {value}"
        ))),
    }
}

/// Read a count field, truncating any fractional part. Negative counts are
/// clamped to zero.
pub fn count_field(record: &RawRecord, key: &str) -> Result<Option<u64>> {
    Ok(number_field(record, key)?.map(|n| n.trunc().max(0.0) as u64))
}

/// Read a string field. Absent and `null` fields are `Ok(None)`; numbers and
/// booleans are stringified.
pub fn string_field(record: &RawRecord, key: &str) -> Result<Option<String>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(v) => Err(MedirankError::invalid_record(format!(
            "field `{key}` must be a string, got {}",
            type_name(v)
        ))),
    }
}

/// Read a tag list field.
///
/// A single string is split on commas; an array has each element
/// stringified. Every tag is trimmed and lowercased, empty tags are dropped
/// and duplicates keep their first position.
pub fn tags_field(record: &RawRecord, key: &str) -> Vec<String> {
    let raw: Vec<String> = match record.get(key) {
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Resolve a record's coordinates.
///
/// The record's own `latitude`/`longitude` win; otherwise a nested `hospital`
/// object's coordinates are used. Anything missing or non-numeric resolves to
/// `None`.
pub fn coordinates(record: &RawRecord) -> Option<GeoPoint> {
    own_coordinates(record).or_else(|| {
        record
            .get("hospital")
            .and_then(Value::as_object)
            .and_then(own_coordinates)
    })
}

fn own_coordinates(record: &RawRecord) -> Option<GeoPoint> {
    let lat = number_field(record, "latitude").ok().flatten()?;
    let lon = number_field(record, "longitude").ok().flatten()?;
    Some(GeoPoint::unchecked(lat, lon))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
