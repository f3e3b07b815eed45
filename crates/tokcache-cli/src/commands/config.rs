use anyhow::Result;
use std::path::Path;
use tokcache_config::Config;

use crate::cli::ConfigCommands;

pub fn handle(cmd: ConfigCommands, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = Config::load_from(path)?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
