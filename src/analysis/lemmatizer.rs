//! Dictionary-style lemmatization.
//!
//! Unlike a stemmer, which chops suffixes until a root remains ("allergies"
//! becomes "allergi"), a lemmatizer maps a word to its dictionary base form
//! ("allergies" becomes "allergy") and leaves words that are already in base
//! form alone. Condition and specialization vocabularies are noun phrases, so
//! the bundled [`EnglishLemmatizer`] lemmatizes nouns: irregular plurals come
//! from an exception table, regular plurals from detachment rules, and
//! singular words that merely end in "s" ("diabetes", "arthritis",
//! "orthopedics") are protected.
//!
//! Every lemma is a fixed point: `lemmatize(lemmatize(w)) == lemmatize(w)`.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Trait for lemmatization algorithms.
pub trait Lemmatizer: Send + Sync {
    /// Reduce a lowercase word to its base form.
    fn lemmatize(&self, word: &str) -> String;

    /// Get the name of this lemmatizer.
    fn name(&self) -> &'static str;
}

/// Irregular plurals, many of them from medical vocabulary.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("diagnoses", "diagnosis"),
    ("prognoses", "prognosis"),
    ("analyses", "analysis"),
    ("metastases", "metastasis"),
    ("neuroses", "neurosis"),
    ("psychoses", "psychosis"),
    ("thromboses", "thrombosis"),
    ("stenoses", "stenosis"),
    ("viruses", "virus"),
    ("fungi", "fungus"),
    ("bacilli", "bacillus"),
    ("bacteria", "bacterium"),
    ("criteria", "criterion"),
    ("vertebrae", "vertebra"),
    ("larvae", "larva"),
    ("indices", "index"),
    ("appendices", "appendix"),
    ("matrices", "matrix"),
    ("cervices", "cervix"),
    ("data", "datum"),
];

/// Singular nouns ending in "s" that the plural rules must not touch.
const PROTECTED_WORDS: &[&str] = &[
    "aids", "alias", "atlas", "bias", "canvas", "diabetes", "gas", "herpes", "lens", "measles",
    "mumps", "news", "pancreas", "rabies", "rickets", "scabies", "series", "shingles", "species",
];

/// Suffixes marking words that are singular already.
const SINGULAR_SUFFIXES: &[&str] = &["ss", "us", "is", "ics"];

static IRREGULAR_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| IRREGULAR_PLURALS.iter().copied().collect());

static PROTECTED_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| PROTECTED_WORDS.iter().copied().collect());

/// English noun lemmatizer.
#[derive(Debug, Clone, Default)]
pub struct EnglishLemmatizer;

impl EnglishLemmatizer {
    /// Create a new English lemmatizer.
    pub fn new() -> Self {
        EnglishLemmatizer
    }

    fn detach_suffix(word: &str) -> Option<String> {
        // Byte slicing below only cuts ASCII suffixes.
        if word.chars().count() <= 3 || !word.ends_with('s') {
            return None;
        }
        if PROTECTED_SET.contains(word) || SINGULAR_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            return None;
        }

        let stem = |n: usize| word[..word.len() - n].to_string();

        if word.ends_with("ies") && word.len() > 4 {
            return Some(format!("{}y", stem(3)));
        }
        if word.ends_with("sses") || word.ends_with("shes") || word.ends_with("xes") {
            return Some(stem(2));
        }
        if word.ends_with("ches") && !word.ends_with("aches") {
            return Some(stem(2));
        }
        Some(stem(1))
    }
}

impl Lemmatizer for EnglishLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = IRREGULAR_MAP.get(word) {
            return (*lemma).to_string();
        }

        match Self::detach_suffix(word) {
            // "mens" detaches to "men", which is itself an irregular plural.
            Some(detached) => match IRREGULAR_MAP.get(detached.as_str()) {
                Some(lemma) => (*lemma).to_string(),
                None => detached,
            },
            None => word.to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "english_noun"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        let lemmatizer = EnglishLemmatizer::new();

        assert_eq!(lemmatizer.lemmatize("disorders"), "disorder");
        assert_eq!(lemmatizer.lemmatize("allergies"), "allergy");
        assert_eq!(lemmatizer.lemmatize("injuries"), "injury");
        assert_eq!(lemmatizer.lemmatize("rashes"), "rash");
        assert_eq!(lemmatizer.lemmatize("abscesses"), "abscess");
        assert_eq!(lemmatizer.lemmatize("reflexes"), "reflex");
        assert_eq!(lemmatizer.lemmatize("branches"), "branch");
        assert_eq!(lemmatizer.lemmatize("headaches"), "headache");
        assert_eq!(lemmatizer.lemmatize("ulcers"), "ulcer");
    }

    #[test]
    fn test_irregular_plurals() {
        let lemmatizer = EnglishLemmatizer::new();

        assert_eq!(lemmatizer.lemmatize("children"), "child");
        assert_eq!(lemmatizer.lemmatize("teeth"), "tooth");
        assert_eq!(lemmatizer.lemmatize("diagnoses"), "diagnosis");
        assert_eq!(lemmatizer.lemmatize("viruses"), "virus");
        assert_eq!(lemmatizer.lemmatize("bacteria"), "bacterium");
    }

    #[test]
    fn test_singular_words_untouched() {
        let lemmatizer = EnglishLemmatizer::new();

        for word in [
            "diabetes",
            "arthritis",
            "osteoporosis",
            "psoriasis",
            "orthopedics",
            "pediatrics",
            "lupus",
            "illness",
            "pancreas",
            "measles",
            "ibs",
            "copd",
            "pain",
            "running",
        ] {
            assert_eq!(lemmatizer.lemmatize(word), word, "{word} should be unchanged");
        }
    }

    #[test]
    fn test_lemmas_are_fixed_points() {
        let lemmatizer = EnglishLemmatizer::new();

        for word in [
            "allergies",
            "classes",
            "rashes",
            "headaches",
            "children",
            "viruses",
            "data",
            "lies",
            "bugs",
            "1990s",
            "disorders",
            "mens",
        ] {
            let once = lemmatizer.lemmatize(word);
            assert_eq!(lemmatizer.lemmatize(&once), once, "{word} -> {once}");
        }
    }
}
