use std::io::{self, Write};

use anyhow::Result;
use chrono::NaiveDate;
use dacc_core::{hourly_filename, BusinessDay};
use dacc_jobs::CcConfig;
use tabwriter::TabWriter;

pub fn handle(
    config: &CcConfig,
    date: NaiveDate,
    timezone: Option<&str>,
    version: Option<u32>,
) -> Result<()> {
    let tz = super::timezone(config, timezone)?;
    let version = version.unwrap_or(config.core.default_version);
    let day = BusinessDay::new(date, tz)?;
    let hours = day.hours();

    println!("Business day {date} ({tz}): {} ({} hours)", day.interval(), hours.len());
    let mut tw = TabWriter::new(io::stdout());
    writeln!(tw, "POS\tINTERVAL (UTC)\tLOCAL\tHOURLY FILE")?;
    for (position, hour) in &hours {
        writeln!(
            tw,
            "{position}\t{hour}\t{}\t{}",
            hour.start().with_timezone(&tz).format("%H:%M %:z"),
            hourly_filename(hour.start(), version, tz)
        )?;
    }
    tw.flush()?;
    Ok(())
}
