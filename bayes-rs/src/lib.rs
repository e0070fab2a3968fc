//! bayes-rs: smoothed Naive Bayes text classification and n-gram language modeling
//!
//! Learns from a labeled corpus and answers two kinds of queries:
//! which class a piece of text most likely belongs to, and how probable a
//! token sequence is under an n-gram model of the same corpus.
//!
//! # Features
//!
//! - Vocabulary with an unknown token and an optional frequency threshold
//! - Token-frequency or document-presence counting
//! - Additive (Laplace / Lidstone) smoothing, scored in log space
//! - Sentence likelihood and perplexity for n-gram models of any order
//! - Parallel training on the rayon pool
//! - JSON model export that reloads to identical probabilities
//!
//! # Example Configuration
//!
//! ```toml
//! [training]
//! alpha = 1.0
//! min_frequency = 2
//! counting = "token_frequency"
//! order = 2
//! padding = true
//!
//! [tokenizer]
//! kind = "regex"
//! pattern = "\\w+"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod counts;
pub mod error;
pub mod frequency;
pub mod model;
pub mod ngram;
pub mod persistence;
pub mod smoothing;
pub mod tokenizer;
pub mod vocabulary;

pub use classifier::{ClassScore, Classification, NaiveBayes, Warning};
pub use config::{Config, TokenizerConfig, TrainingConfig};
pub use corpus::{Corpus, Document};
pub use counts::CountingMode;
pub use error::{ModelError, Result};
pub use frequency::FrequencyTable;
pub use model::{ModelSummary, TrainedModel};
pub use ngram::NgramModel;
pub use persistence::ModelSnapshot;
pub use smoothing::{LikelihoodEstimator, Smoothing};
pub use tokenizer::{RegexTokenizer, StemmingTokenizer, Tokenizer, WhitespaceTokenizer};
pub use vocabulary::{Vocabulary, UNKNOWN_TOKEN};
