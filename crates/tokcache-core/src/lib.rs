//! Core domain types for tokcache
//!
//! This crate contains:
//! - Model catalog and the model-to-tokenizer lookup seam
//! - Error types shared by the workspace

pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{ModelCatalog, ModelEntry, ModelRegistry};
