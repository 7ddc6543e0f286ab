use anyhow::Result;
use dacc_core::{daily_filename, hourly_filename_from_str, BusinessDay};
use dacc_jobs::CcConfig;

use dacc_cli::cli::NameCommands;

pub fn handle(config: &CcConfig, command: &NameCommands) -> Result<()> {
    let name = match command {
        NameCommands::Hourly {
            instant,
            version,
            timezone,
        } => {
            let tz = super::timezone(config, timezone.as_deref())?;
            let version = version.unwrap_or(config.core.default_version);
            hourly_filename_from_str(instant, version, tz)?
        }
        NameCommands::Daily {
            date,
            version,
            artifact,
            timezone,
        } => {
            let tz = super::timezone(config, timezone.as_deref())?;
            let version = version.unwrap_or(config.core.default_version);
            let day = BusinessDay::new(*date, tz)?;
            daily_filename((*artifact).into(), day.interval().start(), version, tz)
        }
    };
    println!("{name}");
    Ok(())
}
