//! Labeled corpus and its tokenized training form

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::error::{ModelError, Result};
use crate::tokenizer::Tokenizer;
use crate::vocabulary::Vocabulary;

/// A single labeled text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub label: String,
}

impl Document {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Ordered sequence of labeled documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Build a corpus from `(text, label)` pairs
    pub fn from_pairs<T, L>(pairs: impl IntoIterator<Item = (T, L)>) -> Self
    where
        T: Into<String>,
        L: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(text, label)| Document::new(text, label))
            .collect()
    }

    /// Parse `label<TAB>text` lines.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_tsv_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut documents = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim_end_matches(['\r', '\n']);

            if trimmed.trim().is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (label, text) = trimmed.split_once('\t').ok_or_else(|| {
                ModelError::Config(format!(
                    "line {}: expected '<label>\\t<text>'",
                    index + 1
                ))
            })?;

            let label = label.trim();
            if label.is_empty() {
                return Err(ModelError::Config(format!("line {}: empty label", index + 1)));
            }

            documents.push(Document::new(text, label));
        }

        Ok(Self { documents })
    }

    pub fn from_tsv_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let corpus = Self::from_tsv_reader(BufReader::new(file))?;
        info!("Loaded {} documents from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    /// Distinct labels, in lexical order
    pub fn labels(&self) -> BTreeSet<&str> {
        self.documents.iter().map(|d| d.label.as_str()).collect()
    }

    /// Resolve the class set: the configured one if given, otherwise the
    /// labels present in the corpus. Returned in lexical order.
    pub fn resolve_classes(&self, configured: &[String]) -> Result<Vec<String>> {
        if configured.is_empty() {
            return Ok(self.labels().into_iter().map(String::from).collect());
        }

        let allowed: BTreeSet<&str> = configured.iter().map(String::as_str).collect();
        if let Some(doc) = self.documents.iter().find(|d| !allowed.contains(d.label.as_str())) {
            return Err(ModelError::UnknownLabel(doc.label.clone()));
        }

        Ok(allowed.into_iter().map(String::from).collect())
    }

    /// Tokenize every document, optionally on the rayon pool
    pub fn tokenize(&self, tokenizer: &dyn Tokenizer, parallel: bool) -> Vec<TokenizedDocument> {
        let tokenize_one = |doc: &Document| TokenizedDocument {
            label: doc.label.clone(),
            tokens: tokenizer.tokenize(&doc.text),
        };

        if parallel {
            self.documents.par_iter().map(tokenize_one).collect()
        } else {
            self.documents.iter().map(tokenize_one).collect()
        }
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// A document after tokenization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedDocument {
    pub label: String,
    pub tokens: Vec<String>,
}

/// Everything the training passes need: resolved classes, the vocabulary,
/// and the documents with rare tokens already remapped to the unknown token.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub classes: Vec<String>,
    pub vocabulary: Vocabulary,
    pub documents: Vec<TokenizedDocument>,
}

impl TrainingSet {
    pub fn prepare(corpus: &Corpus, tokenizer: &dyn Tokenizer, config: &TrainingConfig) -> Result<Self> {
        if corpus.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }
        config.validate()?;

        let classes = corpus.resolve_classes(&config.classes)?;
        let tokenized = corpus.tokenize(tokenizer, config.parallel);

        let vocabulary = Vocabulary::from_documents(
            tokenized.iter().map(|d| d.tokens.as_slice()),
            config.min_frequency,
        )?;

        let documents: Vec<TokenizedDocument> = tokenized
            .into_iter()
            .map(|doc| TokenizedDocument {
                tokens: vocabulary.remap(&doc.tokens),
                label: doc.label,
            })
            .collect();

        debug!(
            "Prepared {} documents over {} classes, vocabulary size {}",
            documents.len(),
            classes.len(),
            vocabulary.len()
        );

        Ok(Self {
            classes,
            vocabulary,
            documents,
        })
    }
}
