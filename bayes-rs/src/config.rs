//! Configuration for bayes-rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::counts::CountingMode;
use crate::error::{ModelError, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Training parameters
    #[serde(default)]
    pub training: TrainingConfig,
    /// Tokenizer selection
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Training parameters shared by the classifier and the language model
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrainingConfig {
    /// Additive smoothing constant (0 = maximum likelihood)
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Tokens seen fewer times than this collapse into the unknown token
    #[serde(default)]
    pub min_frequency: u64,
    /// Token-frequency or document-presence counting
    #[serde(default)]
    pub counting: CountingMode,
    /// N-gram order of the language model
    #[serde(default = "default_order")]
    pub order: usize,
    /// Wrap each document in sentence boundary markers
    #[serde(default)]
    pub padding: bool,
    /// Class labels; empty means infer from the corpus
    #[serde(default)]
    pub classes: Vec<String>,
    /// Count documents on the rayon pool
    #[serde(default)]
    pub parallel: bool,
}

/// Tokenizer implementations selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    Whitespace,
    Regex,
    Stemming,
}

/// Tokenizer configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenizerConfig {
    #[serde(default = "default_tokenizer_kind")]
    pub kind: TokenizerKind,
    /// Whitespace tokenizer only
    #[serde(default = "default_strip_punctuation")]
    pub strip_punctuation: bool,
    /// Regex tokenizer only
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Shortest token kept, in characters
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_alpha() -> f64 {
    1.0
}

fn default_order() -> usize {
    2
}

fn default_tokenizer_kind() -> TokenizerKind {
    TokenizerKind::Regex
}

fn default_strip_punctuation() -> bool {
    true
}

fn default_pattern() -> String {
    r"\w+".to_string()
}

fn default_min_length() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            min_frequency: 0,
            counting: CountingMode::default(),
            order: default_order(),
            padding: false,
            classes: Vec::new(),
            parallel: false,
        }
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: default_tokenizer_kind(),
            strip_punctuation: default_strip_punctuation(),
            pattern: default_pattern(),
            min_length: default_min_length(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TrainingConfig {
    /// Validate training parameters
    pub fn validate(&self) -> Result<()> {
        crate::smoothing::Smoothing::new(self.alpha)?;

        if self.order < 1 {
            return Err(ModelError::InvalidOrder {
                order: self.order,
                reason: "order must be >= 1".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for class in &self.classes {
            if class.is_empty() {
                return Err(ModelError::Config("class labels must not be empty".to_string()));
            }
            if !seen.insert(class.as_str()) {
                return Err(ModelError::Config(format!("duplicate class label '{}'", class)));
            }
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ModelError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;

        if self.tokenizer.kind == TokenizerKind::Regex {
            regex::Regex::new(&self.tokenizer.pattern).map_err(|e| {
                ModelError::Config(format!(
                    "Invalid tokenizer pattern '{}': {}",
                    self.tokenizer.pattern, e
                ))
            })?;
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ModelError::Config(format!(
                "Unknown logging format '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.training.alpha, 1.0);
        assert_eq!(config.training.order, 2);
        assert_eq!(config.training.counting, CountingMode::TokenFrequency);
        assert_eq!(config.tokenizer.kind, TokenizerKind::Regex);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[training]
alpha = 0.5
min_frequency = 2
counting = "document_presence"
order = 3
classes = ["ham", "spam"]

[tokenizer]
kind = "whitespace"
strip_punctuation = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.training.alpha, 0.5);
        assert_eq!(config.training.min_frequency, 2);
        assert_eq!(config.training.counting, CountingMode::DocumentPresence);
        assert_eq!(config.training.order, 3);
        assert_eq!(config.training.classes, vec!["ham", "spam"]);
        assert_eq!(config.tokenizer.kind, TokenizerKind::Whitespace);
        assert!(!config.tokenizer.strip_punctuation);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let mut config = Config::default();
        config.training.alpha = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidSmoothingParameter { .. })
        ));
    }

    #[test]
    fn test_zero_order_rejected() {
        let mut config = Config::default();
        config.training.order = 0;
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidOrder { order: 0, .. })
        ));
    }

    #[test]
    fn test_duplicate_classes_rejected() {
        let mut config = Config::default();
        config.training.classes = vec!["spam".to_string(), "spam".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
