//! Feature preprocessing for raw entity records.
//!
//! Each `preprocess_*` function turns one loosely typed JSON record into a
//! typed record with defaults filled in, or reports why it cannot. The batch
//! variants never fail: a bad record is logged and left out, and every other
//! record is processed as usual.
//!
//! Doctor defaults:
//!
//! | field | default |
//! |---|---|
//! | `specialization` | `"general"` |
//! | `rating` | `4.0` |
//! | `patients_treated` | `0` |
//! | `consultation_fee` (or `consultation_fee_inr`) | `500.0` |
//! | `conditions_treated` | `[]` |
//!
//! `experience_years` has no default; a doctor without it cannot be used for
//! training and is dropped.

use serde_json::Value;

use crate::entity::{
    DoctorRecord, HospitalRecord, RawRecord, as_record, coordinates, count_field, describe,
    number_field, string_field, tags_field,
};
use crate::error::{MedirankError, Result};

pub const DEFAULT_SPECIALIZATION: &str = "general";
pub const DEFAULT_RATING: f64 = 4.0;
pub const DEFAULT_CONSULTATION_FEE: f64 = 500.0;

/// Conditions commonly treated within a specialty, keyed by a specialization
/// substring.
pub const COMMON_CONDITIONS: &[(&str, &[&str])] = &[
    ("pulmonology", &["asthma", "copd", "bronchitis", "pneumonia"]),
    ("cardiology", &["hypertension", "heart disease", "arrhythmia", "heart failure"]),
    ("neurology", &["migraine", "epilepsy", "stroke", "multiple sclerosis"]),
    ("orthopedics", &["arthritis", "osteoporosis", "back pain", "joint pain"]),
    ("endocrinology", &["diabetes", "thyroid disorders", "hormonal imbalance"]),
    ("psychiatry", &["depression", "anxiety", "bipolar disorder", "schizophrenia"]),
    ("dermatology", &["acne", "psoriasis", "eczema", "skin cancer"]),
    ("gastroenterology", &["ibs", "ulcer", "crohn disease", "hepatitis"]),
];

/// Preprocess a single doctor record.
pub fn preprocess_doctor(value: &Value) -> Result<DoctorRecord> {
    let record = as_record(value)?;

    let experience_years = number_field(record, "experience_years")?
        .ok_or_else(|| MedirankError::invalid_record("missing required field `experience_years`"))?;

    let consultation_fee = match number_field(record, "consultation_fee")? {
        Some(fee) => fee,
        None => number_field(record, "consultation_fee_inr")?.unwrap_or(DEFAULT_CONSULTATION_FEE),
    };

    Ok(DoctorRecord {
        id: record.get("id").cloned().unwrap_or(Value::Null),
        name: string_field(record, "name")?.unwrap_or_default(),
        specialization: specialization(record)?
            .unwrap_or_else(|| DEFAULT_SPECIALIZATION.to_string()),
        experience_years,
        rating: number_field(record, "rating")?.unwrap_or(DEFAULT_RATING),
        patients_treated: count_field(record, "patients_treated")?.unwrap_or(0),
        consultation_fee,
        conditions_treated: tags_field(record, "conditions_treated"),
        location: coordinates(record),
    })
}

/// Preprocess a batch of doctor records, dropping the ones that fail.
pub fn preprocess_doctor_batch(values: &[Value]) -> Vec<DoctorRecord> {
    preprocess_batch(values, "doctor", preprocess_doctor)
}

/// Preprocess a single hospital record.
///
/// Hospitals have no required fields. `doctor_count` falls back to the
/// length of a `doctors` array.
pub fn preprocess_hospital(value: &Value) -> Result<HospitalRecord> {
    let record = as_record(value)?;

    let doctor_count = match count_field(record, "doctor_count")? {
        Some(count) => count as usize,
        None => record
            .get("doctors")
            .and_then(Value::as_array)
            .map_or(0, Vec::len),
    };

    Ok(HospitalRecord {
        id: record.get("id").cloned().unwrap_or(Value::Null),
        name: string_field(record, "name")?.unwrap_or_default(),
        specialization: specialization(record)?.unwrap_or_default(),
        diseases_treated: tags_field(record, "diseases_treated"),
        available_beds: number_field(record, "available_beds")?.unwrap_or(0.0),
        doctor_count,
        location: coordinates(record),
    })
}

/// Preprocess a batch of hospital records, dropping the ones that fail.
pub fn preprocess_hospital_batch(values: &[Value]) -> Vec<HospitalRecord> {
    preprocess_batch(values, "hospital", preprocess_hospital)
}

/// Add the catalog conditions for every specialty whose name occurs in the
/// doctor's specialization. Existing tags keep their order; new tags are
/// appended once.
pub fn expand_specialty_conditions(doctor: &mut DoctorRecord) {
    for (specialty, conditions) in COMMON_CONDITIONS {
        if !doctor.specialization.contains(specialty) {
            continue;
        }
        for condition in conditions.iter() {
            if !doctor.conditions_treated.iter().any(|c| c == condition) {
                doctor.conditions_treated.push((*condition).to_string());
            }
        }
    }
}

fn specialization(record: &RawRecord) -> Result<Option<String>> {
    Ok(string_field(record, "specialization")?.map(|s| s.trim().to_lowercase()))
}

fn preprocess_batch<T>(values: &[Value], kind: &str, f: impl Fn(&Value) -> Result<T>) -> Vec<T> {
    let mut processed = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        match f(value) {
            Ok(record) => processed.push(record),
            Err(e) => {
                let who = value
                    .as_object()
                    .map(describe)
                    .unwrap_or_else(|| format!("#{index}"));
                tracing::warn!("dropping {kind} record {who}: {e}");
            }
        }
    }

    if processed.len() < values.len() {
        tracing::info!(
            "preprocessed {} of {} {kind} records",
            processed.len(),
            values.len()
        );
    }
    processed
}
