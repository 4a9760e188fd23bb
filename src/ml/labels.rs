//! Multi-label binarization of condition tags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Maps tag strings to label-vector positions and back.
///
/// Classes are the sorted union of every tag seen at fit time, so the label
/// space is deterministic for a given training batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiLabelBinarizer {
    classes: Vec<String>,
}

impl MultiLabelBinarizer {
    /// Fit the label space over a collection of tag sets.
    pub fn fit<S: AsRef<str>>(tag_sets: &[Vec<S>]) -> Self {
        let classes: BTreeSet<&str> = tag_sets
            .iter()
            .flat_map(|tags| tags.iter().map(AsRef::as_ref))
            .collect();

        MultiLabelBinarizer {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    /// Encode one tag set as a 0/1 vector. Unknown tags are ignored.
    pub fn transform<S: AsRef<str>>(&self, tags: &[S]) -> Vec<bool> {
        let mut row = vec![false; self.classes.len()];
        for tag in tags {
            if let Some(i) = self.index_of(tag.as_ref()) {
                row[i] = true;
            }
        }
        row
    }

    /// Encode every tag set.
    pub fn transform_all<S: AsRef<str>>(&self, tag_sets: &[Vec<S>]) -> Vec<Vec<bool>> {
        tag_sets.iter().map(|tags| self.transform(tags)).collect()
    }

    /// Decode a 0/1 vector back into tags.
    pub fn inverse_transform(&self, row: &[bool]) -> Vec<&str> {
        self.classes
            .iter()
            .zip(row)
            .filter(|(_, set)| **set)
            .map(|(class, _)| class.as_str())
            .collect()
    }

    /// Position of a class in the label vector.
    pub fn index_of(&self, class: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(class)).ok()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_sorts_and_dedupes() {
        let mlb = MultiLabelBinarizer::fit(&[
            vec!["migraine", "stroke"],
            vec!["acne"],
            vec!["stroke", "acne"],
            vec![],
        ]);

        assert_eq!(mlb.classes(), &["acne", "migraine", "stroke"]);
        assert_eq!(mlb.index_of("stroke"), Some(2));
        assert_eq!(mlb.index_of("gout"), None);
    }

    #[test]
    fn test_transform_and_inverse() {
        let mlb = MultiLabelBinarizer::fit(&[vec!["asthma", "copd"], vec!["eczema"]]);

        let row = mlb.transform(&["eczema", "asthma", "unknown"]);
        assert_eq!(row, vec![true, false, true]);
        assert_eq!(mlb.inverse_transform(&row), vec!["asthma", "eczema"]);
    }

    #[test]
    fn test_empty_label_space() {
        let mlb = MultiLabelBinarizer::fit::<&str>(&[vec![], vec![]]);
        assert!(mlb.is_empty());
        assert!(mlb.transform(&["x"]).is_empty());
    }
}
