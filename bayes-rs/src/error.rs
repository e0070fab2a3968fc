//! Error types for bayes-rs

use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Model error types
///
/// Structural training errors are fatal. Numeric edge cases (zero likelihood,
/// infinite perplexity) are returned as values, never as errors.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Training corpus has no documents
    #[error("Training corpus is empty")]
    EmptyCorpus,

    /// Smoothing parameter is negative or not finite, or the vocabulary is empty
    #[error("Invalid smoothing parameter alpha={alpha}: {reason}")]
    InvalidSmoothingParameter { alpha: f64, reason: String },

    /// N-gram order is unusable for the given corpus
    #[error("Invalid n-gram order {order}: {reason}")]
    InvalidOrder { order: usize, reason: String },

    /// Perplexity requested for a sequence with no scorable windows
    #[error("Token sequence is empty: no n-gram windows to score")]
    EmptySequence,

    /// Document label outside the configured class set
    #[error("Unknown class label: {0}")]
    UnknownLabel(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot could not be turned back into a model
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
