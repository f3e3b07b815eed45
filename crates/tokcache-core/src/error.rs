use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model {0} has no tokenizer reference")]
    MissingTokenizerRef(String),

    #[error("Unknown tokenizer scheme: {0}")]
    UnknownScheme(String),

    #[error("Fallback tokenizer unavailable: {0}")]
    FallbackUnavailable(String),

    #[error("Tokenizing with '{scheme}' failed: {reason}")]
    Encode { scheme: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// True when the model id could not be mapped to a tokenizer scheme.
    ///
    /// These are configuration defects and are always propagated to the caller.
    pub fn is_unresolved_model(&self) -> bool {
        matches!(self, Error::ModelNotFound(_) | Error::MissingTokenizerRef(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
