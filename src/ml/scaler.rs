//! Feature matrix construction.
//!
//! Numeric columns are standardized to zero mean and unit variance with
//! statistics fitted on the training batch. Categorical columns pass through
//! unscaled as the ordinal position of the value among the sorted categories
//! seen at fit time.

use serde::{Deserialize, Serialize};

use crate::entity::DoctorRecord;
use crate::error::Result;
use crate::ml::MLError;

/// Numeric doctor features used when none are configured.
pub fn default_numeric_features() -> Vec<String> {
    ["experience_years", "rating", "patients_treated", "consultation_fee"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Categorical doctor features used when none are configured.
pub fn default_categorical_features() -> Vec<String> {
    vec!["specialization".to_string()]
}

/// Standardizes columns: `(x - mean) / std`.
///
/// The standard deviation is the population one. A constant column has its
/// scale set to 1 so it maps to zeros instead of NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics over row-major data.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(MLError::TrainingFailed {
                message: "cannot fit a scaler on zero rows".to_string(),
            }
            .into());
        };
        let width = first.len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(MLError::InvalidFeatureVector {
                message: "rows have different lengths".to_string(),
            }
            .into());
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, x) in means.iter_mut().zip(row) {
                *mean += x;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((var, x), mean) in scales.iter_mut().zip(row).zip(&means) {
                *var += (x - mean).powi(2);
            }
        }
        for s in scales.iter_mut() {
            let std = (*s / n).sqrt();
            *s = if std > f64::EPSILON { std } else { 1.0 };
        }

        Ok(StandardScaler { means, scales })
    }

    /// Scale one row in place.
    pub fn transform(&self, row: &mut [f64]) -> Result<()> {
        if row.len() != self.means.len() {
            return Err(MLError::InvalidFeatureVector {
                message: format!("expected {} columns, got {}", self.means.len(), row.len()),
            }
            .into());
        }
        for ((x, mean), scale) in row.iter_mut().zip(&self.means).zip(&self.scales) {
            *x = (*x - mean) / scale;
        }
        Ok(())
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

/// Turns doctor records into feature rows: scaled numeric columns followed by
/// categorical ordinals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransformer {
    numeric_features: Vec<String>,
    categorical_features: Vec<String>,
    scaler: StandardScaler,
    /// Sorted distinct values per categorical feature.
    categories: Vec<Vec<String>>,
}

impl FeatureTransformer {
    /// Fit the transformer on a training batch.
    pub fn fit(
        doctors: &[DoctorRecord],
        numeric_features: &[String],
        categorical_features: &[String],
    ) -> Result<Self> {
        let raw: Vec<Vec<f64>> = doctors
            .iter()
            .map(|d| {
                numeric_features
                    .iter()
                    .map(|name| numeric_value(d, name))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;
        let scaler = StandardScaler::fit(&raw)?;

        let categories = categorical_features
            .iter()
            .map(|name| {
                let mut values = doctors
                    .iter()
                    .map(|d| categorical_value(d, name).map(str::to_string))
                    .collect::<Result<Vec<_>>>()?;
                values.sort();
                values.dedup();
                Ok(values)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureTransformer {
            numeric_features: numeric_features.to_vec(),
            categorical_features: categorical_features.to_vec(),
            scaler,
            categories,
        })
    }

    /// Transform one record. Categorical values unseen at fit time map to -1.
    pub fn transform(&self, doctor: &DoctorRecord) -> Result<Vec<f64>> {
        let mut row = self
            .numeric_features
            .iter()
            .map(|name| numeric_value(doctor, name))
            .collect::<Result<Vec<_>>>()?;
        self.scaler.transform(&mut row)?;

        for (name, categories) in self.categorical_features.iter().zip(&self.categories) {
            let value = categorical_value(doctor, name)?;
            let ordinal = categories
                .binary_search_by(|c| c.as_str().cmp(value))
                .map_or(-1.0, |i| i as f64);
            row.push(ordinal);
        }
        Ok(row)
    }

    /// Transform a batch of records.
    pub fn transform_all(&self, doctors: &[DoctorRecord]) -> Result<Vec<Vec<f64>>> {
        doctors.iter().map(|d| self.transform(d)).collect()
    }

    pub fn n_features(&self) -> usize {
        self.numeric_features.len() + self.categorical_features.len()
    }

    pub fn numeric_features(&self) -> &[String] {
        &self.numeric_features
    }

    pub fn categorical_features(&self) -> &[String] {
        &self.categorical_features
    }
}

/// Look up a numeric feature on a doctor by name.
pub fn numeric_value(doctor: &DoctorRecord, name: &str) -> Result<f64> {
    match name {
        "experience_years" => Ok(doctor.experience_years),
        "rating" => Ok(doctor.rating),
        "patients_treated" => Ok(doctor.patients_treated as f64),
        "consultation_fee" | "consultation_fee_inr" => Ok(doctor.consultation_fee),
        other => Err(MLError::InvalidFeatureVector {
            message: format!("unknown numeric feature `{other}`"),
        }
        .into()),
    }
}

/// Look up a categorical feature on a doctor by name.
pub fn categorical_value<'a>(doctor: &'a DoctorRecord, name: &str) -> Result<&'a str> {
    match name {
        "specialization" => Ok(&doctor.specialization),
        other => Err(MLError::InvalidFeatureVector {
            message: format!("unknown categorical feature `{other}`"),
        }
        .into()),
    }
}
