use std::path::Path;

use anyhow::{bail, Context, Result};
use dacc_jobs::CcConfig;

use dacc_cli::cli::ConfigCommands;

pub fn handle(path: Option<&Path>, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = super::load_config(path)?;
            let text = toml::to_string_pretty(&config).context("serializing config")?;
            print!("{text}");
        }
        ConfigCommands::Init { force } => {
            let target = match path {
                Some(path) => path.to_path_buf(),
                None => CcConfig::config_path().context("could not determine config directory")?,
            };
            if target.exists() && !force {
                bail!(
                    "config '{}' already exists (use --force to overwrite)",
                    target.display()
                );
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating config directory '{}'", parent.display()))?;
            }
            CcConfig::default()
                .save_to(&target)
                .with_context(|| format!("writing config '{}'", target.display()))?;
            println!("Wrote default config to {}", target.display());
        }
    }
    Ok(())
}
