//! Business-calendar interval model.
//!
//! A business day is a local-calendar day in a fixed business timezone,
//! represented in UTC as a half-open [`BusinessInterval`]. Partitioning walks
//! the day in one-hour UTC steps, so the number of positions (23, 24 or 25)
//! falls out of the day boundaries rather than being hard-coded:
//!
//! ```text
//! 2019-03-31 Europe/Brussels  2019-03-30T23:00Z/2019-03-31T22:00Z  -> 23 hours
//! 2019-01-08 Europe/Brussels  2019-01-07T23:00Z/2019-01-08T23:00Z  -> 24 hours
//! 2019-10-27 Europe/Brussels  2019-10-26T22:00Z/2019-10-27T23:00Z  -> 25 hours
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CcError, CcResult};

/// Marker replacing the hour-of-day numeral for the second occurrence of an
/// ambiguous local hour (UCTE double-hour convention, e.g. `_0230` -> `_B230`).
pub const DUPLICATE_HOUR_MARKER: char = 'B';

const SHORT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an ISO-8601 instant.
///
/// Accepts RFC 3339 (`2019-01-08T10:30:00+01:00`) and the short UTC form used
/// in capacity-calculation documents (`2019-01-08T09:30Z`).
pub fn parse_instant(raw: &str) -> CcResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = raw.strip_suffix('Z') {
        for format in SHORT_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
                return Ok(Utc.from_utc_datetime(&parsed));
            }
        }
    }
    Err(CcError::Parse(format!("invalid instant '{raw}'")))
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    if instant.second() == 0 && instant.nanosecond() == 0 {
        instant.format("%Y-%m-%dT%H:%MZ").to_string()
    } else {
        instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusinessInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl BusinessInterval {
    /// Build an interval, rejecting empty or inverted bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CcResult<Self> {
        if start >= end {
            return Err(CcError::InputValidation(format!(
                "interval start {} is not before end {}",
                format_instant(&start),
                format_instant(&end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse an ISO-8601 interval string `<start>/<end>`.
    pub fn parse(raw: &str) -> CcResult<Self> {
        let (start, end) = raw
            .split_once('/')
            .ok_or_else(|| CcError::Parse(format!("interval '{raw}' has no '/' separator")))?;
        Self::new(parse_instant(start)?, parse_instant(end)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + self.duration() / 2
    }

    /// Lower bound inclusive, upper bound exclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// True when `next` starts exactly where this interval ends.
    pub fn is_followed_by(&self, next: &BusinessInterval) -> bool {
        self.end == next.start
    }

    /// Interval from this start to `next`'s end.
    pub fn spanning(&self, next: &BusinessInterval) -> CcResult<Self> {
        Self::new(self.start, next.end)
    }

    /// Whether the two intervals share at least one instant.
    pub fn overlaps(&self, other: &BusinessInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for BusinessInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            format_instant(&self.start),
            format_instant(&self.end)
        )
    }
}

impl FromStr for BusinessInterval {
    type Err = CcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BusinessInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BusinessInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// 1-based index of an hour within a business day's partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HourPosition(u32);

impl HourPosition {
    pub fn new(value: u32) -> CcResult<Self> {
        if value == 0 {
            return Err(CcError::InputValidation(
                "hour positions are 1-based".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for HourPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HourPosition {
    type Err = CcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u32>()
            .map_err(|e| CcError::Parse(format!("invalid hour position '{s}': {e}")))?;
        Self::new(value)
    }
}

/// A local-calendar business day and its UTC interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessDay {
    date: NaiveDate,
    tz: Tz,
    interval: BusinessInterval,
}

impl BusinessDay {
    /// `[local midnight, next local midnight)` expressed in UTC.
    pub fn new(date: NaiveDate, tz: Tz) -> CcResult<Self> {
        let next = date
            .succ_opt()
            .ok_or_else(|| CcError::InputValidation(format!("no day follows {date}")))?;
        let interval = BusinessInterval::new(local_midnight(date, tz)?, local_midnight(next, tz)?)?;
        Ok(Self { date, tz, interval })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn interval(&self) -> BusinessInterval {
        self.interval
    }

    pub fn hours(&self) -> BTreeMap<HourPosition, BusinessInterval> {
        partition_into_hours(&self.interval)
    }
}

fn local_midnight(date: NaiveDate, tz: Tz) -> CcResult<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CcError::InputValidation(format!("no midnight on {date}")))?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            CcError::InputValidation(format!("local midnight of {date} does not exist in {tz}"))
        })
}

/// Split a day into consecutive one-hour slices starting at `day.start()`.
///
/// A trailing slice shorter than one hour is clipped to the day's end.
pub fn partition_into_hours(day: &BusinessInterval) -> BTreeMap<HourPosition, BusinessInterval> {
    let mut hours = BTreeMap::new();
    let mut cursor = day.start;
    let mut position = 1;
    while cursor < day.end {
        let next = (cursor + Duration::hours(1)).min(day.end);
        hours.insert(HourPosition(position), BusinessInterval { start: cursor, end: next });
        cursor = next;
        position += 1;
    }
    hours
}

/// Position of the hour containing `instant`.
pub fn position_of(instant: DateTime<Utc>, day: &BusinessInterval) -> CcResult<HourPosition> {
    partition_into_hours(day)
        .into_iter()
        .find(|(_, hour)| hour.contains(instant))
        .map(|(position, _)| position)
        .ok_or_else(|| {
            CcError::NotFound(format!(
                "no hour of {day} contains {}",
                format_instant(&instant)
            ))
        })
}

/// Half-open containment test against an interval string.
pub fn is_within(instant: DateTime<Utc>, interval: &str) -> CcResult<bool> {
    Ok(BusinessInterval::parse(interval)?.contains(instant))
}

fn offset_seconds(instant: DateTime<Utc>, tz: Tz) -> i32 {
    tz.offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc()
}

/// True for instants in the second occurrence of the hour repeated when the
/// local offset drops from +2h to +1h.
pub fn is_duplicate_hour(instant: DateTime<Utc>, tz: Tz) -> bool {
    offset_seconds(instant - Duration::hours(1), tz) == 7200 && offset_seconds(instant, tz) == 3600
}

/// Replace the hour-of-day token of `candidate` with the duplicate-hour marker
/// when `instant` falls in the repeated hour; otherwise return it unchanged.
///
/// The hour token is the first `_HH` whose digit run is two (`_02`) or four
/// (`_0230`) digits long, so eight-digit date tokens are never touched.
pub fn handle_duplicate_hour_naming(candidate: &str, instant: DateTime<Utc>, tz: Tz) -> String {
    if !is_duplicate_hour(instant, tz) {
        return candidate.to_string();
    }
    let hour = instant.with_timezone(&tz).hour();
    let token = format!("_{hour:02}");
    let mut search = 0;
    while let Some(found) = candidate[search..].find(&token) {
        let at = search + found;
        let digits = candidate[at + 1..]
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 2 || digits == 4 {
            return format!(
                "{}_{}{}{}",
                &candidate[..at],
                DUPLICATE_HOUR_MARKER,
                hour % 10,
                &candidate[at + token.len()..]
            );
        }
        search = at + 1;
    }
    candidate.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Brussels;

    fn day(y: i32, m: u32, d: u32) -> BusinessDay {
        BusinessDay::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), Brussels).unwrap()
    }

    #[test]
    fn parses_short_and_rfc3339_instants() {
        let short = parse_instant("2019-01-08T09:30Z").unwrap();
        let full = parse_instant("2019-01-08T10:30:00+01:00").unwrap();
        assert_eq!(short, full);
        assert!(matches!(parse_instant("yesterday"), Err(CcError::Parse(_))));
    }

    #[test]
    fn interval_rejects_inverted_bounds() {
        let err = BusinessInterval::parse("2019-01-08T23:00Z/2019-01-07T23:00Z").unwrap_err();
        assert!(matches!(err, CcError::InputValidation(_)));
        assert!(matches!(
            BusinessInterval::parse("2019-01-08T23:00Z"),
            Err(CcError::Parse(_))
        ));
    }

    #[test]
    fn interval_display_round_trips_short_form() {
        let raw = "2019-01-07T23:00Z/2019-01-08T23:00Z";
        let interval = BusinessInterval::parse(raw).unwrap();
        assert_eq!(interval.to_string(), raw);
        let json = serde_json::to_string(&interval).unwrap();
        assert_eq!(json, format!("\"{raw}\""));
    }

    #[test]
    fn regular_day_has_24_contiguous_hours() {
        let business_day = day(2019, 1, 8);
        assert_eq!(
            business_day.interval().to_string(),
            "2019-01-07T23:00Z/2019-01-08T23:00Z"
        );
        let hours = business_day.hours();
        assert_eq!(hours.len(), 24);
        let slices: Vec<_> = hours.values().collect();
        for hour in &slices {
            assert_eq!(hour.duration().num_seconds(), 3600);
        }
        for pair in slices.windows(2) {
            assert!(pair[0].is_followed_by(pair[1]));
        }
        assert_eq!(slices[0].start(), business_day.interval().start());
        assert_eq!(slices[23].end(), business_day.interval().end());
    }

    #[test]
    fn spring_forward_day_has_23_hours() {
        let business_day = day(2019, 3, 31);
        assert_eq!(
            business_day.interval().to_string(),
            "2019-03-30T23:00Z/2019-03-31T22:00Z"
        );
        assert_eq!(business_day.hours().len(), 23);
    }

    #[test]
    fn fall_back_day_has_25_hours() {
        let business_day = day(2019, 10, 27);
        assert_eq!(business_day.hours().len(), 25);
    }

    #[test]
    fn position_lookup_is_half_open() {
        let interval = day(2019, 1, 8).interval();
        let first = parse_instant("2019-01-07T23:00Z").unwrap();
        let boundary = parse_instant("2019-01-08T00:00Z").unwrap();
        assert_eq!(position_of(first, &interval).unwrap().value(), 1);
        assert_eq!(position_of(boundary, &interval).unwrap().value(), 2);
        let after = parse_instant("2019-01-08T23:00Z").unwrap();
        assert!(matches!(
            position_of(after, &interval),
            Err(CcError::NotFound(_))
        ));
    }

    #[test]
    fn is_within_excludes_upper_bound() {
        let interval = "2019-01-08T10:00Z/2019-01-08T11:00Z";
        assert!(is_within(parse_instant("2019-01-08T10:00Z").unwrap(), interval).unwrap());
        assert!(is_within(parse_instant("2019-01-08T10:59Z").unwrap(), interval).unwrap());
        assert!(!is_within(parse_instant("2019-01-08T11:00Z").unwrap(), interval).unwrap());
    }

    #[test]
    fn duplicate_hour_uses_marker_only_for_second_occurrence() {
        let first = parse_instant("2019-10-27T00:00Z").unwrap();
        let second = parse_instant("2019-10-27T01:00Z").unwrap();
        let after = parse_instant("2019-10-27T02:00Z").unwrap();
        assert_eq!(
            handle_duplicate_hour_naming("CC_20191027_0230_V01", first, Brussels),
            "CC_20191027_0230_V01"
        );
        assert_eq!(
            handle_duplicate_hour_naming("CC_20191027_0230_V01", second, Brussels),
            "CC_20191027_B230_V01"
        );
        assert_eq!(
            handle_duplicate_hour_naming("CC_20191027_0330_V01", after, Brussels),
            "CC_20191027_0330_V01"
        );
    }

    #[test]
    fn duplicate_hour_skips_date_token() {
        let second = parse_instant("2019-10-27T01:00Z").unwrap();
        assert_eq!(
            handle_duplicate_hour_naming("CRA_02_021", second, Brussels),
            "CRA_B2_021"
        );
        assert_eq!(
            handle_duplicate_hour_naming("CC_02191027", second, Brussels),
            "CC_02191027"
        );
    }

    #[test]
    fn spring_forward_never_triggers_marker() {
        let instant = parse_instant("2019-03-31T01:00Z").unwrap();
        assert!(!is_duplicate_hour(instant, Brussels));
    }
}
