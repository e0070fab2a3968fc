//! N-gram language model
//!
//! Counts every window of `n` consecutive tokens as `(context, next)`, where
//! the context is the first `n - 1` tokens. Windows stay inside a single
//! document. The conditional likelihood uses the same additive smoothing as
//! the classifier, keyed by context instead of class.
//!
//! With padding enabled, each sequence becomes `<s> x (n-1), tokens..., </s>`.
//! The perplexity normaliser `N` is always the number of windows scored:
//! `len - n + 1` unpadded, `len + 1` padded.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::counts::CountTable;
use crate::error::{ModelError, Result};
use crate::smoothing::{LikelihoodEstimator, Smoothing};
use crate::vocabulary::Vocabulary;

/// Sentence start marker used for padding
pub const SENTENCE_START: &str = "<s>";
/// Sentence end marker used for padding
pub const SENTENCE_END: &str = "</s>";

/// Trained n-gram model. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct NgramModel {
    order: usize,
    padding: bool,
    vocabulary: Vocabulary,
    contexts: CountTable<Vec<String>>,
    smoothing: Smoothing,
}

impl NgramModel {
    /// Train on tokenized documents with a vocabulary built from them
    /// (no frequency threshold).
    pub fn train<D>(documents: &[D], order: usize, smoothing: Smoothing, padding: bool) -> Result<Self>
    where
        D: AsRef<[String]> + Sync,
    {
        let vocabulary = Vocabulary::from_documents(documents.iter().map(|d| d.as_ref()), 0)?;
        let documents: Vec<Vec<String>> = documents.iter().map(|d| d.as_ref().to_vec()).collect();
        Self::fit(&documents, vocabulary, order, smoothing, padding, false)
    }

    /// Train with a given vocabulary. Tokens outside it count as the
    /// unknown token.
    pub fn fit<D>(
        documents: &[D],
        mut vocabulary: Vocabulary,
        order: usize,
        smoothing: Smoothing,
        padding: bool,
        parallel: bool,
    ) -> Result<Self>
    where
        D: AsRef<[String]> + Sync,
    {
        if documents.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }
        if order < 1 {
            return Err(ModelError::InvalidOrder {
                order,
                reason: "order must be >= 1".to_string(),
            });
        }
        if documents.iter().all(|d| d.as_ref().len() < order) {
            return Err(ModelError::InvalidOrder {
                order,
                reason: "order exceeds the token count of every training document".to_string(),
            });
        }

        if padding {
            vocabulary.insert_reserved(SENTENCE_END);
        }

        let mut model = Self {
            order,
            padding,
            vocabulary,
            contexts: CountTable::new(),
            smoothing,
        };

        let count_document = |doc: &D| {
            let mut table = CountTable::new();
            let sequence = model.sequence(doc.as_ref());
            for window in sequence.windows(order) {
                let (context, next) = window.split_at(order - 1);
                table.add(context.to_vec(), &next[0], 1);
            }
            table
        };

        let contexts = if parallel {
            documents
                .par_iter()
                .map(count_document)
                .reduce(CountTable::new, |mut left, right| {
                    left.merge(right);
                    left
                })
        } else {
            documents.iter().map(count_document).fold(CountTable::new(), |mut left, right| {
                left.merge(right);
                left
            })
        };
        model.contexts = contexts;

        info!(
            "N-gram model trained: order {}, {} documents, {} contexts, vocabulary size {}",
            order,
            documents.len(),
            model.contexts.len(),
            model.vocabulary.len()
        );

        Ok(model)
    }

    pub(crate) fn from_parts(
        order: usize,
        padding: bool,
        vocabulary: Vocabulary,
        contexts: CountTable<Vec<String>>,
        smoothing: Smoothing,
    ) -> Self {
        Self {
            order,
            padding,
            vocabulary,
            contexts,
            smoothing,
        }
    }

    /// Remap unknown tokens and apply padding
    fn sequence(&self, tokens: &[String]) -> Vec<String> {
        let mut sequence = Vec::with_capacity(tokens.len() + self.order);
        if self.padding {
            sequence.extend(std::iter::repeat(SENTENCE_START.to_string()).take(self.order - 1));
        }
        sequence.extend(tokens.iter().map(|t| self.vocabulary.resolve(t).to_string()));
        if self.padding {
            sequence.push(SENTENCE_END.to_string());
        }
        sequence
    }

    fn estimator(&self) -> LikelihoodEstimator<'_, Vec<String>> {
        LikelihoodEstimator::unchecked(&self.contexts, self.smoothing, self.vocabulary.len())
    }

    /// Smoothed `P(next | context)`.
    ///
    /// Tokens are remapped through the vocabulary; boundary markers are
    /// taken as given.
    pub fn likelihood(&self, context: &[String], next: &str) -> f64 {
        let context = self.resolve_context(context);
        self.estimator().likelihood(self.resolve_marker(next), context.as_slice())
    }

    pub fn log_likelihood(&self, context: &[String], next: &str) -> f64 {
        let context = self.resolve_context(context);
        self.estimator().log_likelihood(self.resolve_marker(next), context.as_slice())
    }

    fn resolve_context(&self, context: &[String]) -> Vec<String> {
        context
            .iter()
            .map(|t| self.resolve_marker(t).to_string())
            .collect()
    }

    fn resolve_marker<'a>(&self, token: &'a str) -> &'a str {
        if self.padding && (token == SENTENCE_START || token == SENTENCE_END) {
            token
        } else {
            self.vocabulary.resolve(token)
        }
    }

    /// Number of windows scored for `tokens`
    pub fn window_count(&self, tokens: &[String]) -> usize {
        let length = if self.padding {
            tokens.len() + self.order
        } else {
            tokens.len()
        };
        (length + 1).saturating_sub(self.order)
    }

    /// Product of the window likelihoods. An input with no windows scores 1.
    ///
    /// Underflows to zero on long inputs even with smoothing;
    /// [`NgramModel::log_sentence_likelihood`] is the canonical computation.
    pub fn sentence_likelihood(&self, tokens: &[String]) -> f64 {
        let estimator = self.estimator();
        self.sequence(tokens)
            .windows(self.order)
            .map(|window| {
                let (context, next) = window.split_at(self.order - 1);
                estimator.likelihood(&next[0], context)
            })
            .product()
    }

    /// Sum of the window log likelihoods
    pub fn log_sentence_likelihood(&self, tokens: &[String]) -> f64 {
        let estimator = self.estimator();
        self.sequence(tokens)
            .windows(self.order)
            .map(|window| {
                let (context, next) = window.split_at(self.order - 1);
                estimator.log_likelihood(&next[0], context)
            })
            .sum()
    }

    /// `L^(-1/N)`, computed in log space.
    ///
    /// Returns `f64::INFINITY` when some window has zero likelihood (only
    /// possible with `alpha = 0`). A zero-length input is an error even with
    /// padding, where it would still yield the `<s> .. </s>` window.
    pub fn perplexity(&self, tokens: &[String]) -> Result<f64> {
        let windows = self.window_count(tokens);
        if tokens.is_empty() || windows == 0 {
            return Err(ModelError::EmptySequence);
        }

        let log_likelihood = self.log_sentence_likelihood(tokens);
        if log_likelihood == f64::NEG_INFINITY {
            return Ok(f64::INFINITY);
        }

        let perplexity = (-log_likelihood / windows as f64).exp();
        debug!("Perplexity over {} windows: {}", windows, perplexity);
        Ok(perplexity)
    }

    /// Raw count of `next` after `context`
    pub fn count(&self, context: &[String], next: &str) -> u64 {
        self.contexts.count(context, next)
    }

    pub fn context_total(&self, context: &[String]) -> u64 {
        self.contexts.total(context)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn padding(&self) -> bool {
        self.padding
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub(crate) fn contexts(&self) -> &CountTable<Vec<String>> {
        &self.contexts
    }
}
