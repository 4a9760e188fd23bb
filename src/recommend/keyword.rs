//! Plain keyword search over doctor records.
//!
//! Callers fall back to this when the classifier has no label matching the
//! query. It matches the lowercased query as a substring of any condition
//! tag or of the specialization, in input order.

use crate::entity::DoctorRecord;

/// Doctors whose conditions or specialization contain `query`, up to `limit`.
pub fn keyword_search<'a>(doctors: &'a [DoctorRecord], query: &str, limit: usize) -> Vec<&'a DoctorRecord> {
    let needle = query.trim().to_lowercase();

    doctors
        .iter()
        .filter(|doctor| {
            doctor.specialization.to_lowercase().contains(&needle)
                || doctor
                    .conditions_treated
                    .iter()
                    .any(|c| c.to_lowercase().contains(&needle))
        })
        .take(limit)
        .collect()
}
