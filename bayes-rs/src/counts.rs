//! Sparse count tables
//!
//! A [`CountTable`] maps a row key (a class label for the frequency table, a
//! context tuple for the n-gram model) to the counts of the tokens observed
//! under it, plus the row total used as the smoothing denominator.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// How a document contributes to the counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingMode {
    /// Every occurrence of a token adds one
    #[default]
    TokenFrequency,
    /// A token adds one per document containing it, however often it occurs
    DocumentPresence,
}

impl CountingMode {
    /// Tokens of one document that should be counted under this mode
    pub fn select<'a>(&self, tokens: &'a [String]) -> Vec<&'a str> {
        match self {
            CountingMode::TokenFrequency => tokens.iter().map(String::as_str).collect(),
            CountingMode::DocumentPresence => {
                let mut seen = HashSet::new();
                tokens
                    .iter()
                    .map(String::as_str)
                    .filter(|t| seen.insert(*t))
                    .collect()
            }
        }
    }
}

/// Counts of the tokens observed under one key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountRow {
    counts: HashMap<String, u64>,
    total: u64,
}

impl CountRow {
    pub fn add(&mut self, token: &str, by: u64) {
        if by == 0 {
            return;
        }
        match self.counts.get_mut(token) {
            Some(count) => *count += by,
            None => {
                self.counts.insert(token.to_string(), by);
            }
        }
        self.total += by;
    }

    pub fn count(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Sum of every increment made to this row
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, &c)| (t.as_str(), c))
    }

    pub fn merge(&mut self, other: CountRow) {
        for (token, count) in other.counts {
            *self.counts.entry(token).or_insert(0) += count;
        }
        self.total += other.total;
    }
}

/// Mapping from row key to [`CountRow`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTable<K: Eq + Hash> {
    rows: HashMap<K, CountRow>,
}

impl<K: Eq + Hash> Default for CountTable<K> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> CountTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `count[(key, token)]` and the key's total by `by`
    pub fn add(&mut self, key: K, token: &str, by: u64) {
        self.rows.entry(key).or_default().add(token, by);
    }

    /// Make sure `key` has a row even if nothing is ever counted under it
    pub fn ensure_row(&mut self, key: K) {
        self.rows.entry(key).or_default();
    }

    pub fn row<Q>(&self, key: &Q) -> Option<&CountRow>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.rows.get(key)
    }

    pub fn count<Q>(&self, key: &Q, token: &str) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.rows.get(key).map_or(0, |row| row.count(token))
    }

    pub fn total<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.rows.get(key).map_or(0, CountRow::total)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &CountRow)> {
        self.rows.iter()
    }

    /// Add every count of `other` into `self`.
    ///
    /// Addition is commutative and associative, so partial tables built
    /// from disjoint slices of a corpus can be merged in any order.
    pub fn merge(&mut self, other: CountTable<K>) {
        for (key, row) in other.rows {
            match self.rows.get_mut(&key) {
                Some(existing) => existing.merge(row),
                None => {
                    self.rows.insert(key, row);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_token_frequency_counts_every_occurrence() {
        let doc = tokens("free free money");
        assert_eq!(
            CountingMode::TokenFrequency.select(&doc),
            vec!["free", "free", "money"]
        );
    }

    #[test]
    fn test_document_presence_counts_once() {
        let doc = tokens("free free money free");
        assert_eq!(
            CountingMode::DocumentPresence.select(&doc),
            vec!["free", "money"]
        );
    }

    #[test]
    fn test_add_and_lookup() {
        let mut table: CountTable<String> = CountTable::new();
        table.add("spam".to_string(), "free", 2);
        table.add("spam".to_string(), "money", 1);
        table.add("ham".to_string(), "free", 1);

        assert_eq!(table.count("spam", "free"), 2);
        assert_eq!(table.count("spam", "tonight"), 0);
        assert_eq!(table.count("missing", "free"), 0);
        assert_eq!(table.total("spam"), 3);
        assert_eq!(table.total("ham"), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_slice_keys() {
        let mut table: CountTable<Vec<String>> = CountTable::new();
        table.add(tokens("a b"), "c", 1);
        let context = tokens("a b");
        assert_eq!(table.count(context.as_slice(), "c"), 1);
        assert_eq!(table.total(context.as_slice()), 1);
    }

    #[test]
    fn test_ensure_row() {
        let mut table: CountTable<String> = CountTable::new();
        table.ensure_row("ham".to_string());
        assert_eq!(table.len(), 1);
        assert_eq!(table.total("ham"), 0);
        assert!(table.row("ham").unwrap().is_empty());
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut a: CountTable<String> = CountTable::new();
        a.add("spam".to_string(), "free", 1);
        let mut b: CountTable<String> = CountTable::new();
        b.add("spam".to_string(), "free", 2);
        b.add("ham".to_string(), "hi", 1);

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        assert_eq!(ab, ba);
        assert_eq!(ab.count("spam", "free"), 3);
        assert_eq!(ab.total("spam"), 3);
    }
}
