//! bayes: train, query and inspect Naive Bayes / n-gram models
//!
//! # Usage
//!
//! ```bash
//! # Train on a tab-separated corpus (label<TAB>text per line)
//! bayes train --corpus sms.tsv --output model.json
//!
//! # Classify a message
//! bayes classify --model model.json "free entry to win cash"
//!
//! # Perplexity of a sentence under the n-gram model
//! bayes perplexity --model model.json "are you free tonight"
//!
//! # Show priors and the most frequent tokens per class
//! bayes inspect --model model.json --top 5
//! ```

use anyhow::Context;
use bayes_rs::tokenizer::build_tokenizer;
use bayes_rs::{Classification, Config, Corpus, TokenizerConfig, TrainedModel, Warning};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bayes")]
#[command(about = "Naive Bayes text classifier and n-gram language model", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model from a labeled corpus
    Train {
        /// Corpus file, one `label<TAB>text` document per line
        #[arg(long)]
        corpus: PathBuf,
        /// Where to write the trained model
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,
    },
    /// Classify text with a trained model
    Classify {
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,
        /// Text to classify
        text: Vec<String>,
    },
    /// Perplexity of text under the n-gram model
    Perplexity {
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,
        text: Vec<String>,
    },
    /// Print a summary of a trained model
    Inspect {
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,
        /// Most frequent tokens to list per class
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate()?;

    init_logging(&config);

    match cli.command {
        Commands::Train { corpus, output } => train(&config, &corpus, &output),
        Commands::Classify { model, text } => {
            let model = load_model(&model)?;
            let tokenizer = build_tokenizer(tokenizer_config(&model, &config))?;
            let classification = model.classify(tokenizer.as_ref(), &text.join(" "));
            print!("{}", render_classification(&classification));
            Ok(())
        }
        Commands::Perplexity { model, text } => {
            let model = load_model(&model)?;
            let tokenizer = build_tokenizer(tokenizer_config(&model, &config))?;
            let perplexity = model.perplexity(tokenizer.as_ref(), &text.join(" "))?;
            println!("{}", perplexity);
            Ok(())
        }
        Commands::Inspect { model, top } => {
            let model = load_model(&model)?;
            inspect(&model, top)
        }
    }
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bayes_rs={},bayes={}", config.logging.level, config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn train(config: &Config, corpus: &Path, output: &Path) -> anyhow::Result<()> {
    info!("Starting bayes v{}", env!("CARGO_PKG_VERSION"));

    let corpus = Corpus::from_tsv_file(corpus)
        .with_context(|| format!("reading corpus {}", corpus.display()))?;
    let tokenizer = build_tokenizer(&config.tokenizer)?;

    let model = TrainedModel::train(&corpus, tokenizer.as_ref(), &config.training)?
        .with_tokenizer_config(config.tokenizer.clone());
    model
        .save(output)
        .with_context(|| format!("writing model to {}", output.display()))?;

    let summary = model.summary();
    println!(
        "Trained on {} documents: {} classes, vocabulary size {}, {} contexts",
        summary.documents,
        summary.classes.len(),
        summary.vocabulary_size,
        summary.contexts
    );
    Ok(())
}

fn load_model(path: &Path) -> anyhow::Result<TrainedModel> {
    TrainedModel::load(path).with_context(|| format!("loading model from {}", path.display()))
}

/// Tokenizer the model was trained with, or the configured one for models
/// saved without it
fn tokenizer_config<'a>(model: &'a TrainedModel, config: &'a Config) -> &'a TokenizerConfig {
    model.tokenizer_config().unwrap_or(&config.tokenizer)
}

/// Predicted label, then one `label score` line per class. The library
/// already logs the empty-input warning; here it is only noted in the output.
fn render_classification(classification: &Classification) -> String {
    let mut out = format!("{}\n", classification.label);
    if classification.warning == Some(Warning::EmptyInput) {
        out.push_str("  (no tokens in input, majority class by prior)\n");
    }
    for score in &classification.scores {
        out.push_str(&format!("  {:<16} {:.6}\n", score.label, score.score));
    }
    out
}

fn inspect(model: &TrainedModel, top: usize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&model.summary())?);

    let classifier = model.classifier();
    for (class, prior) in classifier.priors() {
        println!("{} (prior {:.4})", class, prior);
        for (token, count) in classifier.top_tokens(class, top) {
            println!("  {:<20} {}", token, count);
        }
    }
    Ok(())
}
