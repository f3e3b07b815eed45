//! Tokenizer backends

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use tiktoken_rs::CoreBPE;
use tiktoken_rs::tokenizer::{Tokenizer, get_tokenizer};
use tokcache_core::{Error, Result};

/// Encoding used when nothing else is configured (GPT-4, GPT-3.5-turbo)
pub const DEFAULT_FALLBACK_SCHEME: &str = "cl100k_base";

/// A constructed tokenizer bound to one scheme
pub trait Encoder: Send + Sync {
    /// Number of tokens `text` encodes to
    fn encode_len(&self, text: &str) -> Result<usize>;
}

/// Builds tokenizer handles by scheme name
pub trait TokenizerBackend: Send + Sync {
    type Handle: Encoder;

    /// Construct a handle for exactly `scheme`. Fails for schemes the backend does not know.
    fn for_scheme(&self, scheme: &str) -> Result<Self::Handle>;

    /// Construct the generic handle used when `for_scheme` fails
    fn fallback(&self) -> Result<Self::Handle>;
}

/// tiktoken BPE encoder
pub struct TiktokenEncoder {
    encoding: &'static str,
    bpe: CoreBPE,
}

impl TiktokenEncoder {
    fn load(tokenizer: Tokenizer) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_tokenizer(tokenizer).map_err(|e| Error::Other(e.into()))?;
        Ok(Self {
            encoding: encoding_name(tokenizer),
            bpe,
        })
    }

    /// Name of the encoding backing this handle (not the scheme it is cached under)
    pub fn encoding(&self) -> &str {
        self.encoding
    }
}

impl Encoder for TiktokenEncoder {
    fn encode_len(&self, text: &str) -> Result<usize> {
        // tiktoken panics on some pathological inputs instead of returning an error
        encode_guarded(self.encoding, || {
            self.bpe.encode_with_special_tokens(text).len()
        })
    }
}

thread_local! {
    static IN_ENCODE: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a panic hook that stays silent for panics raised inside `encode_guarded`.
///
/// Those panics surface as [`Error::Encode`] and are logged by the caller, so
/// the panic message never reaches stderr.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !IN_ENCODE.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Run `encode`, turning a panic into [`Error::Encode`]
fn encode_guarded(scheme: &str, encode: impl FnOnce() -> usize) -> Result<usize> {
    install_panic_hook();
    IN_ENCODE.with(|flag| flag.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(encode));
    IN_ENCODE.with(|flag| flag.set(false));

    result.map_err(|payload| Error::Encode {
        scheme: scheme.to_string(),
        reason: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tokenizer panicked".to_string()
    }
}

/// Encoding name as tiktoken spells it
fn encoding_name(tokenizer: Tokenizer) -> &'static str {
    match tokenizer {
        Tokenizer::O200kBase => "o200k_base",
        Tokenizer::Cl100kBase => "cl100k_base",
        Tokenizer::P50kBase => "p50k_base",
        Tokenizer::R50kBase => "r50k_base",
        Tokenizer::P50kEdit => "p50k_edit",
        Tokenizer::Gpt2 => "gpt2",
    }
}

/// Resolve a scheme to a tiktoken encoding.
///
/// Accepts encoding names (`cl100k_base`, ...) and model names tiktoken maps
/// to an encoding (`gpt-4`, `gpt-4o-2024-05-13`, ...).
pub fn resolve_encoding(scheme: &str) -> Option<Tokenizer> {
    let tokenizer = match scheme {
        "o200k_base" => Tokenizer::O200kBase,
        "cl100k_base" => Tokenizer::Cl100kBase,
        "p50k_base" => Tokenizer::P50kBase,
        "p50k_edit" => Tokenizer::P50kEdit,
        "r50k_base" => Tokenizer::R50kBase,
        "gpt2" => Tokenizer::Gpt2,
        _ => return get_tokenizer(scheme),
    };
    Some(tokenizer)
}

/// Backend over tiktoken-rs
#[derive(Debug, Clone)]
pub struct TiktokenBackend {
    fallback_scheme: String,
}

impl TiktokenBackend {
    pub fn new() -> Self {
        Self::with_fallback(DEFAULT_FALLBACK_SCHEME)
    }

    /// Use `scheme` (an encoding or model name) for schemes tiktoken does not know
    pub fn with_fallback(scheme: impl Into<String>) -> Self {
        Self {
            fallback_scheme: scheme.into(),
        }
    }

    pub fn fallback_scheme(&self) -> &str {
        &self.fallback_scheme
    }
}

impl Default for TiktokenBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerBackend for TiktokenBackend {
    type Handle = TiktokenEncoder;

    fn for_scheme(&self, scheme: &str) -> Result<TiktokenEncoder> {
        let tokenizer =
            resolve_encoding(scheme).ok_or_else(|| Error::UnknownScheme(scheme.to_string()))?;
        TiktokenEncoder::load(tokenizer)
    }

    fn fallback(&self) -> Result<TiktokenEncoder> {
        let tokenizer = resolve_encoding(&self.fallback_scheme).ok_or_else(|| {
            Error::FallbackUnavailable(format!(
                "{} is not a tiktoken encoding or model",
                self.fallback_scheme
            ))
        })?;
        TiktokenEncoder::load(tokenizer)
            .map_err(|e| Error::FallbackUnavailable(format!("{}: {}", self.fallback_scheme, e)))
    }
}
