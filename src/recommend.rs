//! Doctor and hospital recommenders.
//!
//! Two independent rankers live here:
//!
//! - [`classifier::ConditionRecommender`] learns which conditions each doctor
//!   treats and ranks doctors for a condition query.
//! - [`location::LocationRecommender`] ranks doctors or hospitals near a
//!   point, blending query similarity with proximity.
//!
//! Both keep their fitted state in a [`holder::ModelHolder`], so queries can
//! run while a new model is being built.

pub mod classifier;
pub mod holder;
pub mod keyword;
pub mod location;
pub mod similarity;

pub use classifier::{ConditionRecommender, Recommendation};
pub use keyword::keyword_search;
pub use location::{LocationQuery, LocationRecommendation, LocationRecommender};
pub use similarity::{DoctorSimilarity, HospitalSimilarity, SimilarityScorer};
