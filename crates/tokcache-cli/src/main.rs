mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tokcache_config::Config;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    match cli.command {
        cli::Commands::Completions { shell } => commands::completions::handle(shell),
        cli::Commands::Config(cmd) => commands::config::handle(cmd, &config_path),
        cli::Commands::Models { json } => {
            let config = Config::load_from(&config_path)?;
            commands::models::handle(&config, json)
        }
        cli::Commands::Count {
            text,
            model,
            file,
            label,
            json,
        } => {
            let config = Config::load_from(&config_path)?;
            let counter = commands::count::build_counter(&config)?;
            commands::count::handle(&counter, &config, text, model, file, &label, json)
        }
    }
}
