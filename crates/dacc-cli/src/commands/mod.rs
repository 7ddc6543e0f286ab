use anyhow::{Context, Result};
use chrono_tz::Tz;
use dacc_jobs::CcConfig;
use std::path::Path;

pub mod completions;
pub mod config;
pub mod hours;
pub mod name;
pub mod run;

/// Effective configuration: the explicit file if given, else the default location.
pub fn load_config(path: Option<&Path>) -> Result<CcConfig> {
    match path {
        Some(path) => CcConfig::load_from(path)
            .with_context(|| format!("loading config '{}'", path.display())),
        None => CcConfig::load().context("loading default config"),
    }
}

/// Command-line timezone override, else the configured one.
pub fn timezone(config: &CcConfig, requested: Option<&str>) -> Result<Tz> {
    match requested {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|err| anyhow::anyhow!("unknown timezone '{name}': {err}")),
        None => Ok(config.timezone()?),
    }
}
