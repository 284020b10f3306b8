use std::collections::{BTreeMap, BTreeSet};

use super::model::{EncodedTable, LabeledTable};
use crate::error::{DatasetError, DatasetResult};

// ---------------------------------------------------------------------------
// LabelVocabulary – distinct known labels
// ---------------------------------------------------------------------------

/// The distinct labels of a table, kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: BTreeSet<String>,
}

impl LabelVocabulary {
    pub fn from_table(table: &LabeledTable) -> Self {
        table.iter().map(|r| r.cluster.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Labels in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for LabelVocabulary {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        LabelVocabulary {
            labels: iter.into_iter().map(str::to_string).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// LabelIndex – label ↔ dense integer
// ---------------------------------------------------------------------------

/// Maps each vocabulary label to its position in sorted order.
///
/// Two vocabularies with the same content always produce the same index,
/// whatever order the labels were first seen in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    label_to_idx: BTreeMap<String, usize>,
    labels: Vec<String>,
}

impl LabelIndex {
    pub fn from_vocabulary(vocabulary: &LabelVocabulary) -> Self {
        let labels: Vec<String> = vocabulary.iter().map(str::to_string).collect();
        let label_to_idx = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        LabelIndex {
            label_to_idx,
            labels,
        }
    }

    /// Index of `label`, if the training data contained it.
    pub fn get(&self, label: &str) -> Option<usize> {
        self.label_to_idx.get(label).copied()
    }

    /// Inverse lookup: the label stored at `idx`.
    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(label, index)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.as_str(), idx))
    }

    pub fn as_map(&self) -> &BTreeMap<String, usize> {
        &self.label_to_idx
    }

    /// Encode a table that did not take part in building the index, such
    /// as the holdout table.
    ///
    /// Fails with [`DatasetError::UnknownLabel`] on the first label the
    /// index does not know.
    pub fn encode_table(&self, table: &LabeledTable) -> DatasetResult<EncodedTable> {
        table.map_labels(|label| {
            self.get(label).ok_or_else(|| DatasetError::UnknownLabel {
                label: label.clone(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::model::{Record, Table};

    fn table(labels: &[&str]) -> LabeledTable {
        Table::new(
            Vec::new(),
            labels
                .iter()
                .enumerate()
                .map(|(i, l)| Record {
                    id: i as i64,
                    cluster: l.to_string(),
                    features: BTreeMap::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn vocabulary_is_distinct_and_sorted() {
        let vocab = LabelVocabulary::from_table(&table(&["b", "a", "c", "a"]));
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(vocab.contains("b"));
        assert!(!vocab.contains("d"));
    }

    #[test]
    fn index_is_contiguous_and_lexicographic() {
        let vocab: LabelVocabulary = ["zeta", "Alpha", "10", "9"].into_iter().collect();
        let index = LabelIndex::from_vocabulary(&vocab);

        // Byte order: digits < uppercase < lowercase, "10" < "9".
        assert_eq!(index.get("10"), Some(0));
        assert_eq!(index.get("9"), Some(1));
        assert_eq!(index.get("Alpha"), Some(2));
        assert_eq!(index.get("zeta"), Some(3));

        let mut indices: Vec<usize> = index.as_map().values().copied().collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..4).collect::<Vec<_>>());
        let keys: Vec<&str> = index.as_map().keys().map(String::as_str).collect();
        assert_eq!(keys, vocab.iter().collect::<Vec<_>>());
    }

    #[test]
    fn index_ignores_encounter_order() {
        let a = LabelIndex::from_vocabulary(&LabelVocabulary::from_table(&table(&[
            "x", "y", "z", "x",
        ])));
        let b = LabelIndex::from_vocabulary(&LabelVocabulary::from_table(&table(&[
            "z", "x", "y",
        ])));
        assert_eq!(a, b);
    }

    #[test]
    fn label_is_inverse_of_get() {
        let vocab: LabelVocabulary = ["b", "a"].into_iter().collect();
        let index = LabelIndex::from_vocabulary(&vocab);
        for (label, idx) in index.iter() {
            assert_eq!(index.label(idx), Some(label));
            assert_eq!(index.get(label), Some(idx));
        }
        assert_eq!(index.label(2), None);
    }

    #[test]
    fn encode_table_reports_unknown_label() {
        let vocab: LabelVocabulary = ["a", "b"].into_iter().collect();
        let index = LabelIndex::from_vocabulary(&vocab);

        let encoded = index.encode_table(&table(&["b", "a", "b"])).unwrap();
        assert_eq!(
            encoded.iter().map(|r| r.cluster).collect::<Vec<_>>(),
            vec![1, 0, 1]
        );

        let err = index.encode_table(&table(&["a", "c"])).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownLabel { ref label } if label == "c"));
    }

    #[test]
    fn empty_vocabulary_gives_empty_index() {
        let index = LabelIndex::from_vocabulary(&LabelVocabulary::default());
        assert!(index.is_empty());
        assert_eq!(index.get("a"), None);
    }
}
