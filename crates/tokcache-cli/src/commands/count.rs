use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tokcache_config::Config;
use tokcache_core::{ModelCatalog, ModelRegistry};
use tokcache_tokens::{CounterOptions, TiktokenBackend, TokenCounter, resolve_encoding};

pub type CliCounter = TokenCounter<ModelCatalog, TiktokenBackend>;

#[derive(Debug, Serialize)]
pub struct CountReport {
    pub model: String,
    pub tokens: usize,
    pub context_tokens: Option<usize>,
    pub remaining: Option<usize>,
}

/// Build the counter for this process, warming up the chat model's tokenizer
pub fn build_counter(config: &Config) -> Result<CliCounter> {
    let fallback = &config.tokens.fallback_scheme;
    if resolve_encoding(fallback).is_none() {
        anyhow::bail!(
            "tokens.fallback_scheme '{}' is not a tiktoken encoding or model",
            fallback
        );
    }

    let counter = TokenCounter::new(
        config.catalog(),
        TiktokenBackend::with_fallback(config.tokens.fallback_scheme.clone()),
        CounterOptions {
            debug_token_count: config.tokens.debug_token_count,
        },
    );

    if config.tokens.warmup {
        if let Err(e) = counter.warm_up_default() {
            tracing::warn!("Tokenizer warm-up failed: {}", e);
        }
    }

    Ok(counter)
}

pub fn handle(
    counter: &CliCounter,
    config: &Config,
    text: Option<String>,
    model: Option<String>,
    file: Option<PathBuf>,
    label: &str,
    json: bool,
) -> Result<()> {
    let model = model
        .or_else(|| config.chat_model.clone())
        .context("No --model given and no chat_model configured")?;
    let text = read_input(text, file)?;

    let report = count(counter, &text, &model, label)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} tokens ({})", report.tokens, report.model);
    if let (Some(window), Some(remaining)) = (report.context_tokens, report.remaining) {
        println!("  Context: {} of {} remaining", remaining, window);
    }

    Ok(())
}

pub fn count(counter: &CliCounter, text: &str, model: &str, label: &str) -> Result<CountReport> {
    Ok(CountReport {
        model: model.to_string(),
        tokens: counter.count_tokens(text, model, label)?,
        context_tokens: counter.registry().context_tokens(model),
        remaining: counter.context_remaining(text, model)?,
    })
}

fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")
}
