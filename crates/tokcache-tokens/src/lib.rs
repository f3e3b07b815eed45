//! Token counting with a per-scheme tokenizer cache (tiktoken)

pub mod backend;
pub mod cache;
pub mod counter;

#[cfg(test)]
mod testing;

pub use backend::{
    DEFAULT_FALLBACK_SCHEME, Encoder, TiktokenBackend, TiktokenEncoder, TokenizerBackend,
    resolve_encoding,
};
pub use cache::TokenizerCache;
pub use counter::{CounterOptions, TokenCounter};
