//! Trained model bundle
//!
//! A [`TrainedModel`] is built once by [`TrainedModel::train`] and is
//! read-only afterwards, so it can be shared across threads and queried
//! concurrently without locking.

use serde::Serialize;
use tracing::info;

use crate::classifier::{Classification, NaiveBayes};
use crate::config::{TokenizerConfig, TrainingConfig};
use crate::corpus::{Corpus, TrainingSet};
use crate::error::Result;
use crate::ngram::NgramModel;
use crate::smoothing::Smoothing;
use crate::tokenizer::Tokenizer;

/// Classifier and language model trained from the same corpus
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    config: TrainingConfig,
    tokenizer: Option<TokenizerConfig>,
    classifier: NaiveBayes,
    language_model: NgramModel,
}

/// Headline numbers of a trained model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub documents: u64,
    pub classes: Vec<String>,
    pub vocabulary_size: usize,
    pub contexts: usize,
    pub alpha: f64,
    pub order: usize,
}

impl TrainedModel {
    /// Train the classifier and the n-gram model on `corpus`
    pub fn train(corpus: &Corpus, tokenizer: &dyn Tokenizer, config: &TrainingConfig) -> Result<Self> {
        let set = TrainingSet::prepare(corpus, tokenizer, config)?;

        let classifier = NaiveBayes::fit(&set, config)?;

        let token_streams: Vec<&[String]> = set.documents.iter().map(|d| d.tokens.as_slice()).collect();
        let language_model = NgramModel::fit(
            &token_streams,
            set.vocabulary.clone(),
            config.order,
            Smoothing::new(config.alpha)?,
            config.padding,
            config.parallel,
        )?;

        let model = Self {
            config: config.clone(),
            tokenizer: None,
            classifier,
            language_model,
        };

        let summary = model.summary();
        info!(
            "Model trained: {} documents, classes {:?}, vocabulary size {}, {} contexts",
            summary.documents, summary.classes, summary.vocabulary_size, summary.contexts
        );

        Ok(model)
    }

    pub(crate) fn from_parts(
        config: TrainingConfig,
        tokenizer: Option<TokenizerConfig>,
        classifier: NaiveBayes,
        language_model: NgramModel,
    ) -> Self {
        Self {
            config,
            tokenizer,
            classifier,
            language_model,
        }
    }

    /// Record the tokenizer settings the model was trained with, so they
    /// travel with the saved model
    pub fn with_tokenizer_config(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn tokenizer_config(&self) -> Option<&TokenizerConfig> {
        self.tokenizer.as_ref()
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn classifier(&self) -> &NaiveBayes {
        &self.classifier
    }

    pub fn language_model(&self) -> &NgramModel {
        &self.language_model
    }

    pub fn classify(&self, tokenizer: &dyn Tokenizer, text: &str) -> Classification {
        self.classifier.classify(tokenizer, text)
    }

    pub fn perplexity(&self, tokenizer: &dyn Tokenizer, text: &str) -> Result<f64> {
        self.language_model.perplexity(&tokenizer.tokenize(text))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            documents: self.classifier.frequency_table().total_documents(),
            classes: self.classifier.classes().to_vec(),
            vocabulary_size: self.classifier.vocabulary().len(),
            contexts: self.language_model.contexts().len(),
            alpha: self.config.alpha,
            order: self.config.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::tokenizer::WhitespaceTokenizer;

    fn corpus() -> Corpus {
        Corpus::from_pairs([
            ("free money now", "spam"),
            ("are you free tonight", "ham"),
            ("call now for money", "spam"),
        ])
    }

    #[test]
    fn test_train_bundle() {
        let model = TrainedModel::train(&corpus(), &WhitespaceTokenizer::default(), &TrainingConfig::default()).unwrap();
        let summary = model.summary();
        assert_eq!(summary.documents, 3);
        assert_eq!(summary.classes, vec!["ham", "spam"]);
        assert_eq!(summary.vocabulary_size, 9);
        assert_eq!(summary.order, 2);
        assert_eq!(model.classifier().vocabulary(), model.language_model().vocabulary());
    }

    #[test]
    fn test_classify_and_perplexity() {
        let tokenizer = WhitespaceTokenizer::default();
        let model = TrainedModel::train(&corpus(), &tokenizer, &TrainingConfig::default()).unwrap();
        assert_eq!(model.classify(&tokenizer, "free now").label, "spam");
        let seen = model.perplexity(&tokenizer, "free money now").unwrap();
        let unseen = model.perplexity(&tokenizer, "tonight money are").unwrap();
        assert!(seen < unseen);
    }

    #[test]
    fn test_order_too_large() {
        let config = TrainingConfig {
            order: 6,
            ..TrainingConfig::default()
        };
        let result = TrainedModel::train(&corpus(), &WhitespaceTokenizer::default(), &config);
        assert!(matches!(result, Err(ModelError::InvalidOrder { order: 6, .. })));
    }

    #[test]
    fn test_invalid_alpha() {
        let config = TrainingConfig {
            alpha: -1.0,
            ..TrainingConfig::default()
        };
        let result = TrainedModel::train(&corpus(), &WhitespaceTokenizer::default(), &config);
        assert!(matches!(result, Err(ModelError::InvalidSmoothingParameter { .. })));
    }

    #[test]
    fn test_model_is_shareable_across_threads() {
        let tokenizer = WhitespaceTokenizer::default();
        let model = std::sync::Arc::new(
            TrainedModel::train(&corpus(), &tokenizer, &TrainingConfig::default()).unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let model = std::sync::Arc::clone(&model);
                std::thread::spawn(move || {
                    model.classify(&WhitespaceTokenizer::default(), "free now").label
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "spam");
        }
    }
}
