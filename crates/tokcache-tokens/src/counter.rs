//! Per-model token counting

use tokcache_core::{ModelRegistry, Result};
use tracing::{debug, error};

use crate::backend::{Encoder, TokenizerBackend};
use crate::cache::TokenizerCache;

/// Characters of counted text allowed into log lines
const PREVIEW_CHARS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct CounterOptions {
    /// Log every count at debug level. Very verbose.
    pub debug_token_count: bool,
}

/// Counts tokens for application models.
///
/// Create one per application and hand it to every call site that needs
/// token counts. Tokenizers are built on first use and reused afterwards.
pub struct TokenCounter<R, B>
where
    R: ModelRegistry,
    B: TokenizerBackend,
{
    registry: R,
    cache: TokenizerCache<B>,
    options: CounterOptions,
}

impl<R, B> TokenCounter<R, B>
where
    R: ModelRegistry,
    B: TokenizerBackend,
{
    pub fn new(registry: R, backend: B, options: CounterOptions) -> Self {
        Self {
            registry,
            cache: TokenizerCache::new(backend),
            options,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn cache(&self) -> &TokenizerCache<B> {
        &self.cache
    }

    /// Count tokens, reporting every failure.
    ///
    /// Unlike [`count_tokens`](Self::count_tokens), tokenizer and encoding
    /// failures come back as errors instead of a zero count.
    pub fn try_count(&self, text: &str, model_id: &str) -> Result<usize> {
        let scheme = self.registry.resolve_tokenizer_ref(model_id)?;
        self.encode(text, scheme)
    }

    /// Best-effort token count of `text` under `model_id`'s tokenizer.
    ///
    /// Fails only when the model cannot be resolved to a tokenizer scheme.
    /// Tokenizer failures are logged and counted as 0.
    pub fn count_tokens(&self, text: &str, model_id: &str, debug_label: &str) -> Result<usize> {
        let scheme = self.registry.resolve_tokenizer_ref(model_id)?;
        let count = self.count_resolved(text, model_id, scheme);

        if self.options.debug_token_count {
            debug!(
                "count_tokens: {}, {}, \"{}\": {}",
                debug_label,
                model_id,
                preview(text),
                count
            );
        }

        Ok(count)
    }

    /// Count several texts for one model, resolving the model once
    pub fn count_batch(&self, texts: &[&str], model_id: &str, debug_label: &str) -> Result<Vec<usize>> {
        let scheme = self.registry.resolve_tokenizer_ref(model_id)?;
        let counts: Vec<usize> = texts
            .iter()
            .map(|text| self.count_resolved(text, model_id, scheme))
            .collect();

        if self.options.debug_token_count {
            debug!(
                "count_batch: {}, {}, {} texts: {}",
                debug_label,
                model_id,
                counts.len(),
                counts.iter().sum::<usize>()
            );
        }

        Ok(counts)
    }

    /// Tokens left in the model's context window after `text`.
    ///
    /// `None` when the model has no context size configured.
    pub fn context_remaining(&self, text: &str, model_id: &str) -> Result<Option<usize>> {
        let used = self.count_tokens(text, model_id, "context")?;
        Ok(self
            .registry
            .context_tokens(model_id)
            .map(|window| window.saturating_sub(used)))
    }

    /// Build the model's tokenizer now instead of on first use
    pub fn warm_up(&self, model_id: &str) -> Result<()> {
        self.try_count("", model_id).map(|_| ())
    }

    /// Warm up the registry's default chat model, if it has one
    pub fn warm_up_default(&self) -> Result<Option<String>> {
        let Some(model_id) = self.registry.default_chat_model() else {
            return Ok(None);
        };
        self.warm_up(model_id)?;
        debug!("Warmed up tokenizer for chat model '{}'", model_id);
        Ok(Some(model_id.to_string()))
    }

    /// Scheme names with a constructed tokenizer
    pub fn cached_schemes(&self) -> Vec<String> {
        self.cache.schemes()
    }

    fn encode(&self, text: &str, scheme: &str) -> Result<usize> {
        self.cache.get_or_create(scheme)?.encode_len(text)
    }

    fn count_resolved(&self, text: &str, model_id: &str, scheme: &str) -> usize {
        match self.encode(text, scheme) {
            Ok(count) => count,
            Err(e) => {
                error!(
                    "Error tokenizing \"{}...\" for model '{}' with scheme '{}': {}",
                    preview(text),
                    model_id,
                    scheme,
                    e
                );
                0
            }
        }
    }
}

/// First characters of `text`, for log lines
fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
