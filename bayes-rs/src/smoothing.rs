//! Additive (Laplace) smoothing
//!
//! ```text
//! likelihood(token | key) = (count[(key, token)] + alpha) / (total[key] + alpha * d)
//! ```
//!
//! where `d` is the vocabulary size. With `alpha > 0` every vocabulary token
//! gets a strictly positive likelihood. With `alpha = 0` an unobserved token
//! gets exactly `0.0` (and `-inf` in log space), including under a key that
//! was never observed at all.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::hash::Hash;

use crate::counts::CountTable;
use crate::error::{ModelError, Result};

/// Validated additive smoothing constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smoothing {
    alpha: f64,
}

impl Smoothing {
    pub fn new(alpha: f64) -> Result<Self> {
        if !alpha.is_finite() {
            return Err(ModelError::InvalidSmoothingParameter {
                alpha,
                reason: "alpha must be finite".to_string(),
            });
        }
        if alpha < 0.0 {
            return Err(ModelError::InvalidSmoothingParameter {
                alpha,
                reason: "alpha must be >= 0".to_string(),
            });
        }
        Ok(Self { alpha })
    }

    /// Add-one smoothing
    pub fn laplace() -> Self {
        Self { alpha: 1.0 }
    }

    /// Unsmoothed maximum likelihood
    pub fn none() -> Self {
        Self { alpha: 0.0 }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn probability(&self, count: u64, total: u64, vocabulary_size: usize) -> f64 {
        let numerator = count as f64 + self.alpha;
        if numerator == 0.0 {
            return 0.0;
        }
        numerator / (total as f64 + self.alpha * vocabulary_size as f64)
    }

    pub fn log_probability(&self, count: u64, total: u64, vocabulary_size: usize) -> f64 {
        let numerator = count as f64 + self.alpha;
        if numerator == 0.0 {
            return f64::NEG_INFINITY;
        }
        numerator.ln() - (total as f64 + self.alpha * vocabulary_size as f64).ln()
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::laplace()
    }
}

/// Smoothed conditional likelihoods over a [`CountTable`]
#[derive(Debug)]
pub struct LikelihoodEstimator<'a, K: Eq + Hash> {
    table: &'a CountTable<K>,
    smoothing: Smoothing,
    vocabulary_size: usize,
}

impl<'a, K: Eq + Hash> LikelihoodEstimator<'a, K> {
    pub fn new(table: &'a CountTable<K>, smoothing: Smoothing, vocabulary_size: usize) -> Result<Self> {
        if vocabulary_size == 0 {
            return Err(ModelError::InvalidSmoothingParameter {
                alpha: smoothing.alpha(),
                reason: "vocabulary is empty".to_string(),
            });
        }
        Ok(Self {
            table,
            smoothing,
            vocabulary_size,
        })
    }

    /// Skip the vocabulary check for callers whose vocabulary always holds
    /// the unknown token
    pub(crate) fn unchecked(table: &'a CountTable<K>, smoothing: Smoothing, vocabulary_size: usize) -> Self {
        Self {
            table,
            smoothing,
            vocabulary_size,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// Smoothed `P(token | key)`.
    ///
    /// `token` is looked up verbatim: out-of-vocabulary remapping is the
    /// caller's job.
    pub fn likelihood<Q>(&self, token: &str, key: &Q) -> f64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.smoothing.probability(
            self.table.count(key, token),
            self.table.total(key),
            self.vocabulary_size,
        )
    }

    /// `ln P(token | key)`, computed as `ln(count + alpha) - ln(total + alpha * d)`
    pub fn log_likelihood<Q>(&self, token: &str, key: &Q) -> f64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.smoothing.log_probability(
            self.table.count(key, token),
            self.table.total(key),
            self.vocabulary_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CountTable<String> {
        let mut table = CountTable::new();
        table.add("spam".to_string(), "free", 2);
        table.add("spam".to_string(), "money", 2);
        table.add("spam".to_string(), "now", 2);
        table.add("ham".to_string(), "tonight", 1);
        table
    }

    #[test]
    fn test_rejects_negative_alpha() {
        assert!(matches!(
            Smoothing::new(-0.5),
            Err(ModelError::InvalidSmoothingParameter { .. })
        ));
        assert!(Smoothing::new(f64::NAN).is_err());
        assert!(Smoothing::new(0.0).is_ok());
    }

    #[test]
    fn test_rejects_empty_vocabulary() {
        let table = table();
        assert!(matches!(
            LikelihoodEstimator::new(&table, Smoothing::laplace(), 0),
            Err(ModelError::InvalidSmoothingParameter { .. })
        ));
    }

    #[test]
    fn test_laplace_formula() {
        let table = table();
        let estimator = LikelihoodEstimator::new(&table, Smoothing::laplace(), 5).unwrap();
        // (2 + 1) / (6 + 5)
        assert!((estimator.likelihood("free", "spam") - 3.0 / 11.0).abs() < 1e-12);
        // (0 + 1) / (1 + 5)
        assert!((estimator.likelihood("free", "ham") - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_positive_for_unseen_with_alpha() {
        let table = table();
        let estimator = LikelihoodEstimator::new(&table, Smoothing::new(0.01).unwrap(), 5).unwrap();
        let p = estimator.likelihood("never-seen", "ham");
        assert!(p > 0.0 && p < 1.0);
        // Unseen key falls back to alpha / (alpha * d)
        assert!((estimator.likelihood("free", "other") - 1.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_alpha_gives_exact_zero() {
        let table = table();
        let estimator = LikelihoodEstimator::new(&table, Smoothing::none(), 5).unwrap();
        assert_eq!(estimator.likelihood("free", "ham"), 0.0);
        assert_eq!(estimator.log_likelihood("free", "ham"), f64::NEG_INFINITY);
        // Zero total under an unseen key is still zero, not NaN
        assert_eq!(estimator.likelihood("free", "other"), 0.0);
        assert_eq!(estimator.log_likelihood("free", "other"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_log_and_linear_agree() {
        let table = table();
        for alpha in [0.0, 0.1, 1.0, 2.5] {
            let estimator = LikelihoodEstimator::new(&table, Smoothing::new(alpha).unwrap(), 5).unwrap();
            for key in ["spam", "ham"] {
                for token in ["free", "money", "now", "tonight"] {
                    let linear = estimator.likelihood(token, key);
                    let log = estimator.log_likelihood(token, key);
                    if linear == 0.0 {
                        assert_eq!(log, f64::NEG_INFINITY);
                    } else {
                        assert!((log.exp() - linear).abs() < 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let table = table();
        let vocabulary = ["free", "money", "now", "tonight", "<unk>"];
        let estimator = LikelihoodEstimator::new(&table, Smoothing::laplace(), vocabulary.len()).unwrap();
        let sum: f64 = vocabulary.iter().map(|t| estimator.likelihood(t, "spam")).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }
}
