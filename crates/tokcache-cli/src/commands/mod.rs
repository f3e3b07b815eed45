pub mod completions;
pub mod config;
pub mod count;
pub mod models;
