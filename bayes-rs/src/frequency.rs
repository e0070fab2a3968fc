//! Per-class token frequency table

use rayon::prelude::*;
use std::collections::HashMap;

use crate::corpus::TokenizedDocument;
use crate::counts::{CountRow, CountTable, CountingMode};
use crate::error::{ModelError, Result};

/// Counts of `(token, class)` pairs, per-class totals and per-class
/// document counts.
///
/// Counts depend only on the multiset of documents, never on their order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    mode: CountingMode,
    classes: Vec<String>,
    counts: CountTable<String>,
    documents: HashMap<String, u64>,
}

impl FrequencyTable {
    /// Create an empty table over `classes`, kept in lexical order
    pub fn new(classes: &[String], mode: CountingMode) -> Self {
        let mut classes = classes.to_vec();
        classes.sort();
        classes.dedup();

        let mut counts = CountTable::new();
        let mut documents = HashMap::new();
        for class in &classes {
            counts.ensure_row(class.clone());
            documents.insert(class.clone(), 0);
        }

        Self {
            mode,
            classes,
            counts,
            documents,
        }
    }

    /// Count every document, partitioning the work across the rayon pool
    /// when `parallel` is set.
    pub fn build(
        documents: &[TokenizedDocument],
        classes: &[String],
        mode: CountingMode,
        parallel: bool,
    ) -> Result<Self> {
        if !parallel {
            let mut table = Self::new(classes, mode);
            for doc in documents {
                table.add_document(&doc.label, &doc.tokens)?;
            }
            return Ok(table);
        }

        documents
            .par_iter()
            .try_fold(
                || Self::new(classes, mode),
                |mut table, doc| {
                    table.add_document(&doc.label, &doc.tokens)?;
                    Ok::<_, ModelError>(table)
                },
            )
            .try_reduce(
                || Self::new(classes, mode),
                |mut left, right| {
                    left.merge(right)?;
                    Ok(left)
                },
            )
    }

    /// Count one document under `class`
    pub fn add_document(&mut self, class: &str, tokens: &[String]) -> Result<()> {
        let documents = self
            .documents
            .get_mut(class)
            .ok_or_else(|| ModelError::UnknownLabel(class.to_string()))?;
        *documents += 1;

        for token in self.mode.select(tokens) {
            self.counts.add(class.to_string(), token, 1);
        }
        Ok(())
    }

    /// Restore a stored class row
    pub(crate) fn restore_class(&mut self, class: &str, documents: u64, counts: impl IntoIterator<Item = (String, u64)>) -> Result<()> {
        let slot = self
            .documents
            .get_mut(class)
            .ok_or_else(|| ModelError::UnknownLabel(class.to_string()))?;
        *slot = documents;

        for (token, count) in counts {
            self.counts.add(class.to_string(), &token, count);
        }
        Ok(())
    }

    /// Add the counts of a partial table built over the same classes
    pub fn merge(&mut self, other: FrequencyTable) -> Result<()> {
        if self.classes != other.classes || self.mode != other.mode {
            return Err(ModelError::Config(
                "cannot merge frequency tables with different classes or counting modes".to_string(),
            ));
        }

        for (class, count) in other.documents {
            *self.documents.entry(class).or_insert(0) += count;
        }
        self.counts.merge(other.counts);
        Ok(())
    }

    pub fn count(&self, token: &str, class: &str) -> u64 {
        self.counts.count(class, token)
    }

    /// Smoothing denominator base for `class`
    pub fn total(&self, class: &str) -> u64 {
        self.counts.total(class)
    }

    pub fn documents(&self, class: &str) -> u64 {
        self.documents.get(class).copied().unwrap_or(0)
    }

    pub fn total_documents(&self) -> u64 {
        self.documents.values().sum()
    }

    /// Classes in lexical order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn mode(&self) -> CountingMode {
        self.mode
    }

    pub fn class_row(&self, class: &str) -> Option<&CountRow> {
        self.counts.row(class)
    }

    pub(crate) fn counts(&self) -> &CountTable<String> {
        &self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(label: &str, text: &str) -> TokenizedDocument {
        TokenizedDocument {
            label: label.to_string(),
            tokens: text.split_whitespace().map(String::from).collect(),
        }
    }

    fn classes() -> Vec<String> {
        vec!["spam".to_string(), "ham".to_string()]
    }

    fn corpus() -> Vec<TokenizedDocument> {
        vec![
            doc("spam", "free money now"),
            doc("ham", "are you free tonight"),
            doc("spam", "call now for money money"),
        ]
    }

    #[test]
    fn test_token_frequency_counts() {
        let table = FrequencyTable::build(&corpus(), &classes(), CountingMode::TokenFrequency, false).unwrap();
        assert_eq!(table.classes(), &["ham".to_string(), "spam".to_string()]);
        assert_eq!(table.count("money", "spam"), 3);
        assert_eq!(table.count("free", "ham"), 1);
        assert_eq!(table.count("tonight", "spam"), 0);
        assert_eq!(table.total("spam"), 8);
        assert_eq!(table.total("ham"), 4);
        assert_eq!(table.documents("spam"), 2);
        assert_eq!(table.documents("ham"), 1);
        assert_eq!(table.total_documents(), 3);
    }

    #[test]
    fn test_document_presence_counts() {
        let table = FrequencyTable::build(&corpus(), &classes(), CountingMode::DocumentPresence, false).unwrap();
        assert_eq!(table.count("money", "spam"), 2);
        assert_eq!(table.total("spam"), 7);
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut table = FrequencyTable::new(&classes(), CountingMode::TokenFrequency);
        let result = table.add_document("promo", &["x".to_string()]);
        assert!(matches!(result, Err(ModelError::UnknownLabel(_))));
    }

    #[test]
    fn test_order_independent() {
        let forward = FrequencyTable::build(&corpus(), &classes(), CountingMode::TokenFrequency, false).unwrap();
        let mut reversed_docs = corpus();
        reversed_docs.reverse();
        let reversed = FrequencyTable::build(&reversed_docs, &classes(), CountingMode::TokenFrequency, false).unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut docs = Vec::new();
        for _ in 0..50 {
            docs.extend(corpus());
        }
        let sequential = FrequencyTable::build(&docs, &classes(), CountingMode::TokenFrequency, false).unwrap();
        let parallel = FrequencyTable::build(&docs, &classes(), CountingMode::TokenFrequency, true).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.documents("spam"), 100);
    }

    #[test]
    fn test_merge_partitions() {
        let docs = corpus();
        let mut left = FrequencyTable::new(&classes(), CountingMode::TokenFrequency);
        left.add_document(&docs[0].label, &docs[0].tokens).unwrap();
        let mut right = FrequencyTable::new(&classes(), CountingMode::TokenFrequency);
        for d in &docs[1..] {
            right.add_document(&d.label, &d.tokens).unwrap();
        }
        left.merge(right).unwrap();

        let whole = FrequencyTable::build(&docs, &classes(), CountingMode::TokenFrequency, false).unwrap();
        assert_eq!(left, whole);
    }

    #[test]
    fn test_merge_rejects_mismatched_tables() {
        let mut left = FrequencyTable::new(&classes(), CountingMode::TokenFrequency);
        let right = FrequencyTable::new(&classes(), CountingMode::DocumentPresence);
        assert!(left.merge(right).is_err());
    }
}
