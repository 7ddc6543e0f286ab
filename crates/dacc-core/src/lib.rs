//! # dacc-core: calendar and naming core for day-ahead capacity calculation
//!
//! A daily capacity-calculation request is split into one optimization job per
//! hour of a *business day*. This crate owns the pieces every other crate
//! agrees on:
//!
//! - [`interval`] - UTC half-open intervals, business days in a local
//!   timezone, hour partitioning that stays correct on 23- and 25-hour days
//! - [`naming`] - canonical hourly/daily artifact names and variant ids
//! - [`error`] - the shared [`CcError`] taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use chrono_tz::Europe::Brussels;
//! use dacc_core::{hourly_filename, BusinessDay};
//!
//! let day = BusinessDay::new(NaiveDate::from_ymd_opt(2019, 10, 27).unwrap(), Brussels).unwrap();
//! for (position, hour) in day.hours() {
//!     println!("{position}: {hour} -> {}", hourly_filename(hour.start(), 1, Brussels));
//! }
//! ```

pub mod error;
pub mod interval;
pub mod naming;

pub use error::{CcError, CcResult, ErrorKind};
pub use interval::{
    handle_duplicate_hour_naming, is_duplicate_hour, is_within, parse_instant,
    partition_into_hours, position_of, BusinessDay, BusinessInterval, HourPosition,
    DUPLICATE_HOUR_MARKER,
};
pub use naming::{
    daily_filename, daily_filename_from_str, hourly_filename, hourly_filename_from_str,
    variant_identifier, DailyArtifact,
};
