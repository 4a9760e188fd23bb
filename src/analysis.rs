//! Text analysis for medical free text.
//!
//! Tokenizers split text into [`token::Token`]s, filters rewrite or drop
//! them, and an [`analyzer::Analyzer`] chains the two. The
//! [`normalizer::TextNormalizer`] wraps the standard chain and is what the
//! rest of the crate calls.

pub mod analyzer;
pub mod lemmatizer;
pub mod normalizer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use normalizer::TextNormalizer;
