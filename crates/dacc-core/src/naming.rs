//! Canonical output names.
//!
//! Every name that encodes an hour of day goes through
//! [`handle_duplicate_hour_naming`], including the daily ones, so the repeated
//! hour of a fall-back day never collides with its first occurrence.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CcResult;
use crate::interval::{handle_duplicate_hour_naming, parse_instant};

/// Daily artifacts produced once a business day is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailyArtifact {
    Document,
    Manifest,
    Log,
}

impl DailyArtifact {
    pub fn prefix(&self) -> &'static str {
        match self {
            DailyArtifact::Document => "CC-DAILY",
            DailyArtifact::Manifest => "CC-MANIFEST",
            DailyArtifact::Log => "CC-LOG",
        }
    }
}

/// `CC-RAO_{yyyyMMdd}_{HH}30_V{VV}.json`, local date and hour of `instant`.
pub fn hourly_filename(instant: DateTime<Utc>, version: u32, tz: Tz) -> String {
    let local = instant.with_timezone(&tz);
    let candidate = format!(
        "CC-RAO_{}_{}30_V{:02}.json",
        local.format("%Y%m%d"),
        local.format("%H"),
        version
    );
    handle_duplicate_hour_naming(&candidate, instant, tz)
}

pub fn hourly_filename_from_str(instant: &str, version: u32, tz: Tz) -> CcResult<String> {
    Ok(hourly_filename(parse_instant(instant)?, version, tz))
}

/// `{prefix}_{yyyyMMdd}_V{VV}.json` for the business day starting at `day_start`.
pub fn daily_filename(
    artifact: DailyArtifact,
    day_start: DateTime<Utc>,
    version: u32,
    tz: Tz,
) -> String {
    let local = day_start.with_timezone(&tz);
    let candidate = format!(
        "{}_{}_V{:02}.json",
        artifact.prefix(),
        local.format("%Y%m%d"),
        version
    );
    handle_duplicate_hour_naming(&candidate, day_start, tz)
}

pub fn daily_filename_from_str(
    artifact: DailyArtifact,
    day_start: &str,
    version: u32,
    tz: Tz,
) -> CcResult<String> {
    Ok(daily_filename(artifact, parse_instant(day_start)?, version, tz))
}

/// Synthetic remedial-action variant id `CRA_{HH}_{seq:03}`, unique within a day.
pub fn variant_identifier(hour_start: DateTime<Utc>, sequence: u32, tz: Tz) -> String {
    let local = hour_start.with_timezone(&tz);
    let candidate = format!("CRA_{}_{:03}", local.format("%H"), sequence);
    handle_duplicate_hour_naming(&candidate, hour_start, tz)
}
