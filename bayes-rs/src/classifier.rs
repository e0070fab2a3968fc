//! Naive Bayes text classifier
//!
//! Scores every class as
//!
//! ```text
//! score(c) = ln prior(c) + sum over tokens of ln likelihood(token | c)
//! ```
//!
//! and predicts the highest-scoring class. Tokens are treated as
//! conditionally independent given the class. This is the usual modeling
//! approximation, not an exact posterior.
//!
//! Ties are broken by lexical order of the class labels: the first label
//! reaching the maximum wins.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TrainingConfig;
use crate::corpus::{Corpus, TrainingSet};
use crate::error::{ModelError, Result};
use crate::frequency::FrequencyTable;
use crate::smoothing::{LikelihoodEstimator, Smoothing};
use crate::tokenizer::Tokenizer;
use crate::vocabulary::Vocabulary;

/// Non-fatal conditions reported alongside a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    /// The text produced no tokens; the prediction is the prior majority class
    EmptyInput,
}

/// Score of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    pub score: f64,
}

/// Classification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Predicted class
    pub label: String,
    /// Log-space score per class, in lexical class order
    pub scores: Vec<ClassScore>,
    pub warning: Option<Warning>,
}

impl Classification {
    pub fn score(&self, label: &str) -> Option<f64> {
        self.scores.iter().find(|s| s.label == label).map(|s| s.score)
    }
}

/// Trained Naive Bayes classifier. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct NaiveBayes {
    vocabulary: Vocabulary,
    table: FrequencyTable,
    priors: Vec<f64>,
    smoothing: Smoothing,
}

impl NaiveBayes {
    /// Tokenize `corpus` and train a classifier on it
    pub fn train(corpus: &Corpus, tokenizer: &dyn Tokenizer, config: &TrainingConfig) -> Result<Self> {
        let set = TrainingSet::prepare(corpus, tokenizer, config)?;
        Self::fit(&set, config)
    }

    /// Train on an already prepared training set
    pub fn fit(set: &TrainingSet, config: &TrainingConfig) -> Result<Self> {
        let smoothing = Smoothing::new(config.alpha)?;
        let table = FrequencyTable::build(&set.documents, &set.classes, config.counting, config.parallel)?;
        let model = Self::from_parts(set.vocabulary.clone(), table, smoothing)?;

        info!(
            "Naive Bayes trained: {} documents, {} classes, vocabulary size {}, alpha {}",
            model.table.total_documents(),
            model.table.classes().len(),
            model.vocabulary.len(),
            smoothing.alpha()
        );

        Ok(model)
    }

    /// Assemble a classifier from its counts, estimating class priors as
    /// class document frequency over total documents.
    pub(crate) fn from_parts(vocabulary: Vocabulary, table: FrequencyTable, smoothing: Smoothing) -> Result<Self> {
        let total_documents = table.total_documents();
        if total_documents == 0 {
            return Err(ModelError::EmptyCorpus);
        }
        // Fails on an empty vocabulary
        LikelihoodEstimator::new(table.counts(), smoothing, vocabulary.len())?;

        let priors = table
            .classes()
            .iter()
            .map(|class| table.documents(class) as f64 / total_documents as f64)
            .collect();

        Ok(Self {
            vocabulary,
            table,
            priors,
            smoothing,
        })
    }

    fn estimator(&self) -> LikelihoodEstimator<'_, String> {
        LikelihoodEstimator::unchecked(self.table.counts(), self.smoothing, self.vocabulary.len())
    }

    /// Tokenize `text` and classify it
    pub fn classify(&self, tokenizer: &dyn Tokenizer, text: &str) -> Classification {
        self.classify_tokens(&tokenizer.tokenize(text))
    }

    /// Classify an already tokenized text
    pub fn classify_tokens(&self, tokens: &[String]) -> Classification {
        let scores = self.log_scores(tokens);
        let label = argmax(&scores);

        let warning = if tokens.is_empty() {
            warn!("Classifying empty input: falling back to prior majority class '{}'", label);
            Some(Warning::EmptyInput)
        } else {
            None
        };

        debug!("Classified {} tokens as '{}'", tokens.len(), label);

        Classification {
            label,
            scores,
            warning,
        }
    }

    /// Log-space score of every class, in lexical class order
    pub fn log_scores(&self, tokens: &[String]) -> Vec<ClassScore> {
        let estimator = self.estimator();
        let tokens: Vec<&str> = tokens.iter().map(|t| self.vocabulary.resolve(t)).collect();

        self.table
            .classes()
            .iter()
            .zip(&self.priors)
            .map(|(class, prior)| {
                let score = tokens
                    .iter()
                    .fold(prior.ln(), |acc, token| acc + estimator.log_likelihood(token, class.as_str()));
                ClassScore {
                    label: class.clone(),
                    score,
                }
            })
            .collect()
    }

    /// Linear-space `prior * product of likelihoods` per class.
    ///
    /// Underflows to zero on long inputs; [`NaiveBayes::log_scores`] is the
    /// canonical computation.
    pub fn linear_scores(&self, tokens: &[String]) -> Vec<ClassScore> {
        let estimator = self.estimator();
        let tokens: Vec<&str> = tokens.iter().map(|t| self.vocabulary.resolve(t)).collect();

        self.table
            .classes()
            .iter()
            .zip(&self.priors)
            .map(|(class, prior)| {
                let score = tokens
                    .iter()
                    .fold(*prior, |acc, token| acc * estimator.likelihood(token, class.as_str()));
                ClassScore {
                    label: class.clone(),
                    score,
                }
            })
            .collect()
    }

    /// Class chosen by the linear-space scores
    pub fn classify_linear(&self, tokens: &[String]) -> String {
        argmax(&self.linear_scores(tokens))
    }

    /// Smoothed `P(token | class)`, with out-of-vocabulary tokens read as the
    /// unknown token. `None` if the class is not part of the model.
    pub fn likelihood(&self, token: &str, class: &str) -> Option<f64> {
        self.has_class(class).then(|| {
            self.estimator()
                .likelihood(self.vocabulary.resolve(token), class)
        })
    }

    pub fn log_likelihood(&self, token: &str, class: &str) -> Option<f64> {
        self.has_class(class).then(|| {
            self.estimator()
                .log_likelihood(self.vocabulary.resolve(token), class)
        })
    }

    pub fn prior(&self, class: &str) -> Option<f64> {
        self.table
            .classes()
            .iter()
            .position(|c| c == class)
            .map(|i| self.priors[i])
    }

    /// `(class, prior)` pairs in lexical class order
    pub fn priors(&self) -> Vec<(&str, f64)> {
        self.table
            .classes()
            .iter()
            .map(String::as_str)
            .zip(self.priors.iter().copied())
            .collect()
    }

    pub fn classes(&self) -> &[String] {
        self.table.classes()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn frequency_table(&self) -> &FrequencyTable {
        &self.table
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// The `k` most frequent tokens of `class`, ties in lexical order
    pub fn top_tokens(&self, class: &str, k: usize) -> Vec<(String, u64)> {
        let Some(row) = self.table.class_row(class) else {
            return Vec::new();
        };

        let mut tokens: Vec<(String, u64)> = row.iter().map(|(t, c)| (t.to_string(), c)).collect();
        tokens.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        tokens.truncate(k);
        tokens
    }

    fn has_class(&self, class: &str) -> bool {
        self.table.classes().iter().any(|c| c == class)
    }
}

/// First class holding the maximum score; scores are in lexical class order
fn argmax(scores: &[ClassScore]) -> String {
    let mut best: Option<&ClassScore> = None;
    for candidate in scores {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|s| s.label.clone()).unwrap_or_default()
}
