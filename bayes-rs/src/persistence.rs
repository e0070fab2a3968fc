//! Model export and import
//!
//! A model is stored as a JSON snapshot of its raw counts, the vocabulary
//! and the training configuration. Priors and the likelihood tables are
//! derived from the counts on load, so a reloaded model answers every
//! query with the same floating point values as the one that was saved.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::classifier::NaiveBayes;
use crate::config::{TokenizerConfig, TrainingConfig};
use crate::counts::CountTable;
use crate::error::{ModelError, Result};
use crate::frequency::FrequencyTable;
use crate::model::TrainedModel;
use crate::ngram::{NgramModel, SENTENCE_END};
use crate::smoothing::Smoothing;
use crate::vocabulary::Vocabulary;

/// Snapshot layout version written by this crate
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub format_version: u32,
    pub config: TrainingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<TokenizerConfig>,
    /// Classifier vocabulary in lexical order, unknown token included
    pub vocabulary: Vec<String>,
    pub classes: Vec<ClassSnapshot>,
    pub contexts: Vec<ContextSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSnapshot {
    pub label: String,
    pub documents: u64,
    pub total: u64,
    pub counts: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub context: Vec<String>,
    pub total: u64,
    pub next: BTreeMap<String, u64>,
}

impl ModelSnapshot {
    /// Capture `model`. Output ordering is deterministic.
    pub fn capture(model: &TrainedModel) -> Self {
        let classifier = model.classifier();
        let table = classifier.frequency_table();

        let classes = table
            .classes()
            .iter()
            .map(|label| {
                let counts: BTreeMap<String, u64> = table
                    .class_row(label)
                    .map(|row| row.iter().map(|(t, c)| (t.to_string(), c)).collect())
                    .unwrap_or_default();
                ClassSnapshot {
                    label: label.clone(),
                    documents: table.documents(label),
                    total: table.total(label),
                    counts,
                }
            })
            .collect();

        let mut contexts: Vec<ContextSnapshot> = model
            .language_model()
            .contexts()
            .iter()
            .map(|(context, row)| ContextSnapshot {
                context: context.clone(),
                total: row.total(),
                next: row.iter().map(|(t, c)| (t.to_string(), c)).collect(),
            })
            .collect();
        contexts.sort_by(|a, b| a.context.cmp(&b.context));

        Self {
            format_version: FORMAT_VERSION,
            config: model.config().clone(),
            tokenizer: model.tokenizer_config().cloned(),
            vocabulary: classifier.vocabulary().iter().map(String::from).collect(),
            classes,
            contexts,
        }
    }

    /// Rebuild the model, checking the stored totals against the counts
    pub fn restore(self) -> Result<TrainedModel> {
        if self.format_version != FORMAT_VERSION {
            return Err(ModelError::Persistence(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }

        let config = self.config;
        config.validate()?;
        let smoothing = Smoothing::new(config.alpha)?;
        let vocabulary = Vocabulary::from_tokens(self.vocabulary, config.min_frequency);

        let labels: Vec<String> = self.classes.iter().map(|c| c.label.clone()).collect();
        let mut seen = HashSet::new();
        if let Some(duplicate) = labels.iter().find(|label| !seen.insert(label.as_str())) {
            return Err(ModelError::Persistence(format!("class '{}' is listed twice", duplicate)));
        }
        let mut table = FrequencyTable::new(&labels, config.counting);
        for class in self.classes {
            let sum: u64 = class.counts.values().sum();
            if sum != class.total {
                return Err(ModelError::Persistence(format!(
                    "class '{}' total {} does not match its counts ({})",
                    class.label, class.total, sum
                )));
            }
            table.restore_class(&class.label, class.documents, class.counts)?;
        }
        let classifier = NaiveBayes::from_parts(vocabulary.clone(), table, smoothing)?;

        let mut lm_vocabulary = vocabulary;
        if config.padding {
            lm_vocabulary.insert_reserved(SENTENCE_END);
        }

        let mut contexts = CountTable::new();
        for snapshot in self.contexts {
            if snapshot.context.len() + 1 != config.order {
                return Err(ModelError::Persistence(format!(
                    "context {:?} does not fit order {}",
                    snapshot.context, config.order
                )));
            }
            let sum: u64 = snapshot.next.values().sum();
            if sum != snapshot.total {
                return Err(ModelError::Persistence(format!(
                    "context {:?} total {} does not match its counts ({})",
                    snapshot.context, snapshot.total, sum
                )));
            }
            for (token, count) in snapshot.next {
                contexts.add(snapshot.context.clone(), &token, count);
            }
        }
        let language_model = NgramModel::from_parts(config.order, config.padding, lm_vocabulary, contexts, smoothing);

        Ok(TrainedModel::from_parts(config, self.tokenizer, classifier, language_model))
    }
}

impl TrainedModel {
    pub fn to_snapshot(&self) -> ModelSnapshot {
        ModelSnapshot::capture(self)
    }

    pub fn from_snapshot(snapshot: ModelSnapshot) -> Result<Self> {
        snapshot.restore()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: ModelSnapshot = serde_json::from_str(json)?;
        snapshot.restore()
    }

    /// Write the model to `path`. The file is replaced atomically so a
    /// reader never observes a partial model.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| ModelError::Io(e.error))?;

        info!("Model saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let model = Self::from_json(&json)?;
        debug!("Model loaded from {}", path.display());
        Ok(model)
    }
}
