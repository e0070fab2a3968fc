//! Vocabulary builder
//!
//! The vocabulary is the set of distinct training tokens plus the reserved
//! [`UNKNOWN_TOKEN`]. The unknown token is always present so inference-time
//! lookups of unseen words never fail. With a minimum frequency `t`, tokens
//! seen fewer than `t` times across the whole corpus are left out and their
//! occurrences are counted as the unknown token instead.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::corpus::Corpus;
use crate::error::{ModelError, Result};
use crate::tokenizer::Tokenizer;

/// Reserved token standing in for rare and out-of-vocabulary words
pub const UNKNOWN_TOKEN: &str = "<unk>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: BTreeSet<String>,
    min_frequency: u64,
}

impl Vocabulary {
    /// Tokenize `corpus` and build its vocabulary
    pub fn build(corpus: &Corpus, tokenizer: &dyn Tokenizer, min_frequency: u64) -> Result<Self> {
        let tokenized: Vec<Vec<String>> = corpus
            .iter()
            .map(|doc| tokenizer.tokenize(&doc.text))
            .collect();
        Self::from_documents(tokenized.iter().map(Vec::as_slice), min_frequency)
    }

    /// Build from already tokenized documents
    pub fn from_documents<'a, I>(documents: I, min_frequency: u64) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut frequencies: HashMap<&str, u64> = HashMap::new();
        let mut document_count = 0usize;

        for tokens in documents {
            document_count += 1;
            for token in tokens {
                *frequencies.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        if document_count == 0 {
            return Err(ModelError::EmptyCorpus);
        }

        let mut tokens: BTreeSet<String> = BTreeSet::new();
        let mut collapsed = 0usize;
        for (token, frequency) in frequencies {
            if frequency >= min_frequency {
                tokens.insert(token.to_string());
            } else {
                collapsed += 1;
            }
        }
        tokens.insert(UNKNOWN_TOKEN.to_string());

        debug!(
            "Vocabulary built from {} documents: {} tokens, {} collapsed below frequency {}",
            document_count,
            tokens.len(),
            collapsed,
            min_frequency
        );

        Ok(Self {
            tokens,
            min_frequency,
        })
    }

    /// Rebuild a vocabulary from a stored token list
    pub fn from_tokens<I, S>(tokens: I, min_frequency: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: BTreeSet<String> = tokens.into_iter().map(Into::into).collect();
        tokens.insert(UNKNOWN_TOKEN.to_string());
        Self {
            tokens,
            min_frequency,
        }
    }

    /// Add a reserved token such as a sentence boundary marker
    pub fn insert_reserved(&mut self, token: &str) {
        self.tokens.insert(token.to_string());
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// The token itself if known, otherwise [`UNKNOWN_TOKEN`]
    pub fn resolve<'a>(&self, token: &'a str) -> &'a str {
        if self.tokens.contains(token) {
            token
        } else {
            UNKNOWN_TOKEN
        }
    }

    pub fn remap(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| self.resolve(t).to_string())
            .collect()
    }

    /// Vocabulary size `d`, unknown token included
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Never true: the unknown token is always a member
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn min_frequency(&self) -> u64 {
        self.min_frequency
    }

    /// Tokens in lexical order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}
