//! Model catalog - maps application model ids to tokenizer schemes

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A language model known to the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Tokenizer scheme (encoding or tokenizer model name) used to count tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_ref: Option<String>,

    /// Context window size in tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_tokens: Option<usize>,
}

impl ModelEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            tokenizer_ref: None,
            context_tokens: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_tokenizer_ref(mut self, tokenizer_ref: impl Into<String>) -> Self {
        self.tokenizer_ref = Some(tokenizer_ref.into());
        self
    }

    pub fn with_context_tokens(mut self, tokens: usize) -> Self {
        self.context_tokens = Some(tokens);
        self
    }

    /// Label for display, falling back to the id
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Lookup from model id to tokenizer scheme
pub trait ModelRegistry: Send + Sync {
    /// Resolve a model id to its tokenizer scheme name.
    ///
    /// Fails with [`Error::ModelNotFound`] or [`Error::MissingTokenizerRef`].
    fn resolve_tokenizer_ref(&self, model_id: &str) -> Result<&str>;

    /// Model to warm the tokenizer cache with at startup
    fn default_chat_model(&self) -> Option<&str> {
        None
    }

    fn context_tokens(&self, _model_id: &str) -> Option<usize> {
        None
    }
}

/// In-memory model registry
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelEntry>,
    chat_model: Option<String>,
    fast_model: Option<String>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelEntry>) -> Self {
        Self {
            models,
            chat_model: None,
            fast_model: None,
        }
    }

    pub fn with_chat_model(mut self, id: impl Into<String>) -> Self {
        self.chat_model = Some(id.into());
        self
    }

    pub fn with_fast_model(mut self, id: impl Into<String>) -> Self {
        self.fast_model = Some(id.into());
        self
    }

    /// Register a model, replacing any entry with the same id
    pub fn insert(&mut self, entry: ModelEntry) {
        match self.models.iter_mut().find(|m| m.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.models.push(entry),
        }
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.id == model_id)
    }

    pub fn models(&self) -> &[ModelEntry] {
        &self.models
    }

    pub fn chat_model(&self) -> Option<&str> {
        self.chat_model.as_deref()
    }

    pub fn fast_model(&self) -> Option<&str> {
        self.fast_model.as_deref()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelRegistry for ModelCatalog {
    fn resolve_tokenizer_ref(&self, model_id: &str) -> Result<&str> {
        let entry = self
            .get(model_id)
            .ok_or_else(|| Error::ModelNotFound(model_id.to_string()))?;

        entry
            .tokenizer_ref
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| Error::MissingTokenizerRef(model_id.to_string()))
    }

    fn default_chat_model(&self) -> Option<&str> {
        self.chat_model()
    }

    fn context_tokens(&self, model_id: &str) -> Option<usize> {
        self.get(model_id).and_then(|m| m.context_tokens)
    }
}
