use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tokcache")]
#[command(about = "Count LLM tokens per model", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "TOKCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count tokens in text, a file, or stdin
    Count {
        /// Text to count (reads stdin when neither TEXT nor --file is given)
        text: Option<String>,

        /// Model id from the config (default: chat_model)
        #[arg(short, long)]
        model: Option<String>,

        /// Read text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Label included in debug logs
        #[arg(long, default_value = "cli")]
        label: String,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured models
    Models {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the config file path
    Path,

    /// Print the effective configuration
    Show,
}
