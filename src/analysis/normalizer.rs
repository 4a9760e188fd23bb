//! Free-text normalization for specializations and condition tags.
//!
//! [`TextNormalizer`] is the single entry point the recommenders use to put
//! query text and entity text into the same form:
//!
//! ```text
//! "Pain in the Lower Backs" → lowercase → word tokens → drop stopwords → lemmas
//!                           → "pain lower back"
//! ```
//!
//! Normalization never fails. If the analysis pipeline reports an error the
//! normalizer logs it and returns the plain lowercase of the input instead.
//! Already-normalized text is a fixed point.

use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::token_filter::{LemmaFilter, LowercaseFilter, StopFilter};
use crate::analysis::tokenizer::RegexTokenizer;
use crate::error::Result;

static SHARED: LazyLock<Arc<TextNormalizer>> = LazyLock::new(|| Arc::new(TextNormalizer::new()));

/// Lowercases, tokenizes, removes stopwords and lemmatizes text.
#[derive(Clone)]
pub struct TextNormalizer {
    analyzer: Option<Arc<dyn Analyzer>>,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("analyzer", &self.analyzer.as_ref().map(|a| a.name()))
            .finish()
    }
}

impl TextNormalizer {
    /// Create a normalizer with the standard English pipeline.
    pub fn new() -> Self {
        match Self::standard_pipeline() {
            Ok(analyzer) => Self::with_analyzer(Arc::new(analyzer)),
            Err(e) => {
                tracing::warn!("text pipeline unavailable, normalizing by lowercase only: {e}");
                TextNormalizer { analyzer: None }
            }
        }
    }

    /// Process-wide normalizer instance.
    pub fn shared() -> Arc<TextNormalizer> {
        Arc::clone(&SHARED)
    }

    /// Create a normalizer around a custom analyzer.
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>) -> Self {
        TextNormalizer {
            analyzer: Some(analyzer),
        }
    }

    /// The stopword pass runs twice so a lemma that happens to be a stopword
    /// cannot survive into output that a second pass would then drop.
    fn standard_pipeline() -> Result<PipelineAnalyzer> {
        let stop = Arc::new(StopFilter::new());
        Ok(PipelineAnalyzer::new(Arc::new(RegexTokenizer::new()?))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(stop.clone())
            .add_filter(Arc::new(LemmaFilter::new()))
            .add_filter(stop)
            .with_name("medical_text"))
    }

    /// Normalize free text.
    ///
    /// ```
    /// use medirank::analysis::normalizer::TextNormalizer;
    ///
    /// let normalizer = TextNormalizer::new();
    /// assert_eq!(normalizer.normalize("Disorders of the Thyroid"), "disorder thyroid");
    /// assert_eq!(normalizer.normalize(""), "");
    /// ```
    pub fn normalize(&self, text: &str) -> String {
        let Some(analyzer) = &self.analyzer else {
            return text.to_lowercase();
        };

        match analyzer.analyze(text) {
            Ok(tokens) => tokens
                .filter(|t| !t.is_stopped())
                .map(|t| t.text)
                .collect::<Vec<_>>()
                .join(" "),
            Err(e) => {
                tracing::warn!("normalization failed, falling back to lowercase: {e}");
                text.to_lowercase()
            }
        }
    }

    /// Normalize a JSON value. Anything other than a string normalizes to
    /// the empty string.
    pub fn normalize_value(&self, value: &Value) -> String {
        match value {
            Value::String(text) => self.normalize(text),
            _ => String::new(),
        }
    }

    /// Normalize a list of tags, dropping tags that normalize to nothing and
    /// keeping the first occurrence of duplicates.
    pub fn normalize_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<String> {
        let mut seen = ahash::AHashSet::new();
        tags.iter()
            .map(|tag| self.normalize(tag.as_ref()))
            .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
            .collect()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::TokenStream;
    use crate::error::MedirankError;
    use serde_json::json;

    struct FailingAnalyzer;

    impl Analyzer for FailingAnalyzer {
        fn analyze(&self, _text: &str) -> Result<TokenStream> {
            Err(MedirankError::analysis("tokenizer exploded"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_normalize_removes_stopwords_and_lemmatizes() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("Heart Diseases"), "heart disease");
        assert_eq!(normalizer.normalize("pain in the joints"), "pain joint");
        assert_eq!(normalizer.normalize("Type-2 Diabetes"), "type 2 diabetes");
        assert_eq!(normalizer.normalize("  Crohn's   disease "), "crohn disease");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = TextNormalizer::new();

        for text in [
            "Thyroid Disorders",
            "Allergies and Skin Rashes",
            "Mens health",
            "the ares of it",
            "COPD, asthma; bronchitis",
        ] {
            let once = normalizer.normalize(text);
            assert_eq!(normalizer.normalize(&once), once, "{text}");
        }
    }

    #[test]
    fn test_non_string_values_normalize_to_empty() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize_value(&json!(42)), "");
        assert_eq!(normalizer.normalize_value(&json!(null)), "");
        assert_eq!(normalizer.normalize_value(&json!(["acne"])), "");
        assert_eq!(normalizer.normalize_value(&json!("Acne")), "acne");
    }

    #[test]
    fn test_pipeline_failure_falls_back_to_lowercase() {
        let normalizer = TextNormalizer::with_analyzer(Arc::new(FailingAnalyzer));
        assert_eq!(normalizer.normalize("Back PAIN in the"), "back pain in the");
    }

    #[test]
    fn test_normalize_tags_dedupes_and_drops_empty() {
        let normalizer = TextNormalizer::new();
        let tags = normalizer.normalize_tags(&["Migraines", "migraine", "the", "Stroke"]);
        assert_eq!(tags, vec!["migraine", "stroke"]);
    }
}
