//! config init / config show

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use std::path::Path;
use syncopate_common::config::{write_toml_config, TomlConfig};
use syncopate_common::Location;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a config file
    Init {
        #[arg(long)]
        api_base_url: Option<String>,
        #[arg(long)]
        default_location: Option<Location>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config in effect
    Show,
}

pub fn run(command: &ConfigCommand, path: &Path, current: &TomlConfig) -> Result<()> {
    match command {
        ConfigCommand::Init {
            api_base_url,
            default_location,
            force,
        } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to replace it)", path.display());
            }
            let config = TomlConfig {
                api_base_url: api_base_url.clone(),
                default_location: *default_location,
                ..TomlConfig::default()
            };
            write_toml_config(&config, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Config written to {}", path.display());
            println!("Wrote {}", path.display());
            Ok(())
        }
        ConfigCommand::Show => {
            let rendered = toml::to_string_pretty(current).context("Failed to render config")?;
            println!("# {}", path.display());
            print!("{}", rendered);
            Ok(())
        }
    }
}
