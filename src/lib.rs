//! # Medirank
//!
//! Doctor and hospital recommendations from loosely structured records.
//!
//! ## Features
//!
//! - Medical text normalization (tokenize, stop-word removal, lemmatization)
//! - Record preprocessing with per-field defaults
//! - Condition-based doctor ranking with a seeded multi-label random forest
//! - Location-aware ranking of doctors and hospitals
//! - Versioned, checksummed model artifacts

pub mod analysis;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod geo;
pub mod ml;
pub mod preprocess;
pub mod recommend;

pub mod prelude {
    pub use crate::analysis::TextNormalizer;
    pub use crate::config::MedirankConfig;
    pub use crate::entity::{DoctorRecord, EntityKind, HospitalRecord};
    pub use crate::error::{MedirankError, Result};
    pub use crate::geo::GeoPoint;
    pub use crate::recommend::{
        ConditionRecommender, LocationQuery, LocationRecommendation, LocationRecommender,
        Recommendation,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
