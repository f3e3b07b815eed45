use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokcache_core::{ModelCatalog, ModelEntry};

/// Configuration for tokcache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model used for chat; its tokenizer is warmed up at startup
    #[serde(default = "default_chat_model", skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,

    #[serde(default = "default_fast_model", skip_serializing_if = "Option::is_none")]
    pub fast_model: Option<String>,

    #[serde(default)]
    pub tokens: TokensConfig,

    #[serde(default = "default_models")]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensConfig {
    /// Encoding used when a model's own scheme is unknown to the tokenizer
    #[serde(default = "default_fallback_scheme")]
    pub fallback_scheme: String,

    /// Log every count. Very verbose.
    #[serde(default)]
    pub debug_token_count: bool,

    #[serde(default = "default_warmup")]
    pub warmup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat_model: default_chat_model(),
            fast_model: default_fast_model(),
            tokens: TokensConfig::default(),
            models: default_models(),
        }
    }
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            fallback_scheme: default_fallback_scheme(),
            debug_token_count: false,
            warmup: default_warmup(),
        }
    }
}

fn default_chat_model() -> Option<String> {
    Some("gpt-4o".to_string())
}

fn default_fast_model() -> Option<String> {
    Some("gpt-3.5-turbo".to_string())
}

fn default_fallback_scheme() -> String {
    "cl100k_base".to_string()
}

fn default_warmup() -> bool {
    true
}

fn default_models() -> Vec<ModelEntry> {
    vec![
        ModelEntry::new("gpt-4o")
            .with_label("GPT-4o")
            .with_tokenizer_ref("gpt-4o")
            .with_context_tokens(128_000),
        ModelEntry::new("gpt-4")
            .with_label("GPT-4")
            .with_tokenizer_ref("gpt-4")
            .with_context_tokens(8_192),
        ModelEntry::new("gpt-4-32k")
            .with_label("GPT-4 32k")
            .with_tokenizer_ref("gpt-4-32k")
            .with_context_tokens(32_768),
        ModelEntry::new("gpt-3.5-turbo")
            .with_label("GPT-3.5 Turbo")
            .with_tokenizer_ref("gpt-3.5-turbo")
            .with_context_tokens(16_385),
        // Not a tiktoken model; counted with the fallback encoding
        ModelEntry::new("claude-3-5-sonnet")
            .with_label("Claude 3.5 Sonnet")
            .with_tokenizer_ref("claude-3-5-sonnet")
            .with_context_tokens(200_000),
    ]
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if it does not exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, config.to_toml()?)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "tokcache", "tokcache") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.tokcache/config.toml")
        }
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tokens.fallback_scheme.trim().is_empty() {
            anyhow::bail!("tokens.fallback_scheme must not be empty");
        }

        let mut seen = std::collections::HashSet::new();
        for model in &self.models {
            if !seen.insert(model.id.as_str()) {
                anyhow::bail!("duplicate model id in config: {}", model.id);
            }
        }

        for (key, id) in [("chat_model", &self.chat_model), ("fast_model", &self.fast_model)] {
            if let Some(id) = id {
                if !seen.contains(id.as_str()) {
                    anyhow::bail!("{} '{}' is not listed in [[models]]", key, id);
                }
            }
        }

        Ok(())
    }

    /// Build the model registry described by this config
    pub fn catalog(&self) -> ModelCatalog {
        let mut catalog = ModelCatalog::new(self.models.clone());
        if let Some(id) = &self.chat_model {
            catalog = catalog.with_chat_model(id.clone());
        }
        if let Some(id) = &self.fast_model {
            catalog = catalog.with_fast_model(id.clone());
        }
        catalog
    }
}
