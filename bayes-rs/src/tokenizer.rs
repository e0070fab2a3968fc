//! Tokenizer boundary
//!
//! The models never split text themselves: they receive a [`Tokenizer`] and
//! consume whatever lowercase token sequence it yields. Three implementations
//! ship with the crate, and any `Fn(&str) -> Vec<String>` closure works too.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::config::{TokenizerConfig, TokenizerKind};
use crate::error::{ModelError, Result};

/// Converts raw text into an ordered sequence of normalized tokens.
///
/// Implementations must never yield the empty string.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text).into_iter().filter(|t| !t.is_empty()).collect()
    }
}

/// Splits on whitespace, optionally dropping ASCII punctuation.
#[derive(Debug, Clone)]
pub struct WhitespaceTokenizer {
    strip_punctuation: bool,
    min_length: usize,
}

impl WhitespaceTokenizer {
    pub fn new(strip_punctuation: bool) -> Self {
        Self {
            strip_punctuation,
            min_length: 1,
        }
    }

    /// Drop tokens shorter than `min_length` characters
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length.max(1);
        self
    }
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|word| {
                let lower = word.to_lowercase();
                if self.strip_punctuation {
                    lower.chars().filter(|c| !c.is_ascii_punctuation()).collect()
                } else {
                    lower
                }
            })
            .filter(|t: &String| t.chars().count() >= self.min_length)
            .collect()
    }
}

/// Extracts every match of a word pattern from the lowercased text.
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    pattern: Regex,
    min_length: usize,
}

impl RegexTokenizer {
    pub const DEFAULT_PATTERN: &'static str = r"\w+";

    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ModelError::Config(format!("Invalid tokenizer pattern '{}': {}", pattern, e)))?;
        Ok(Self {
            pattern,
            min_length: 1,
        })
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length.max(1);
        self
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.pattern
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .filter(|t| t.chars().count() >= self.min_length)
            .collect()
    }
}

/// Splits on non-alphanumeric characters and reduces each word to its
/// English stem.
pub struct StemmingTokenizer {
    stemmer: Stemmer,
    min_length: usize,
}

impl StemmingTokenizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            min_length: 1,
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length.max(1);
        self
    }
}

impl Default for StemmingTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for StemmingTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.chars().count() >= self.min_length)
            .map(|s| self.stemmer.stem(s).to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Build the tokenizer described by a `[tokenizer]` config section
pub fn build_tokenizer(config: &TokenizerConfig) -> Result<Box<dyn Tokenizer>> {
    let tokenizer: Box<dyn Tokenizer> = match config.kind {
        TokenizerKind::Whitespace => Box::new(
            WhitespaceTokenizer::new(config.strip_punctuation).with_min_length(config.min_length),
        ),
        TokenizerKind::Regex => {
            Box::new(RegexTokenizer::new(&config.pattern)?.with_min_length(config.min_length))
        }
        TokenizerKind::Stemming => {
            Box::new(StemmingTokenizer::new().with_min_length(config.min_length))
        }
    };
    Ok(tokenizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_strips_punctuation() {
        let tokenizer = WhitespaceTokenizer::new(true);
        assert_eq!(
            tokenizer.tokenize("FREE money, NOW!!!"),
            vec!["free", "money", "now"]
        );
    }

    #[test]
    fn test_whitespace_keeps_punctuation() {
        let tokenizer = WhitespaceTokenizer::new(false);
        assert_eq!(tokenizer.tokenize("Hi, you"), vec!["hi,", "you"]);
    }

    #[test]
    fn test_whitespace_never_yields_empty_tokens() {
        let tokenizer = WhitespaceTokenizer::new(true);
        assert_eq!(tokenizer.tokenize("a ... !!! b"), vec!["a", "b"]);
    }

    #[test]
    fn test_regex_tokenizer() {
        let tokenizer = RegexTokenizer::new(RegexTokenizer::DEFAULT_PATTERN).unwrap();
        assert_eq!(
            tokenizer.tokenize("Call 09061701461 now: WINNER!"),
            vec!["call", "09061701461", "now", "winner"]
        );
    }

    #[test]
    fn test_regex_tokenizer_min_length() {
        let tokenizer = RegexTokenizer::new(r"\w+").unwrap().with_min_length(3);
        assert_eq!(tokenizer.tokenize("u r the one"), vec!["the", "one"]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            RegexTokenizer::new("(unclosed"),
            Err(ModelError::Config(_))
        ));
    }

    #[test]
    fn test_stemming_tokenizer() {
        let tokenizer = StemmingTokenizer::new();
        assert_eq!(
            tokenizer.tokenize("Running winners"),
            vec!["run", "winner"]
        );
    }

    #[test]
    fn test_closure_tokenizer_filters_empty() {
        let tokenizer = |text: &str| -> Vec<String> {
            text.split(',').map(|s| s.trim().to_string()).collect()
        };
        assert_eq!(Tokenizer::tokenize(&tokenizer, "a,,b"), vec!["a", "b"]);
    }

    #[test]
    fn test_build_from_config() {
        let config = TokenizerConfig {
            kind: TokenizerKind::Whitespace,
            strip_punctuation: true,
            pattern: RegexTokenizer::DEFAULT_PATTERN.to_string(),
            min_length: 1,
        };
        let tokenizer = build_tokenizer(&config).unwrap();
        assert_eq!(tokenizer.tokenize("Hello, World"), vec!["hello", "world"]);
    }
}
