//! # dacc-jobs
//!
//! Hourly job orchestration for day-ahead capacity calculation: one
//! optimization job per hour of a business day, dispatched concurrently,
//! completed in any order, aggregated exactly once.
//!
//! ## Core Components
//!
//! - [`Orchestrator`]: builds and dispatches [`HourlyJobRequest`]s
//! - [`CompletionTracker`]: the day's single serialized mutation point
//! - [`OptimizationEngine`]: async seam to the external optimizer
//! - [`DailyAggregator`]: async seam invoked with the final [`DailyOutcome`]
//! - [`CcConfig`]: TOML configuration
//!
//! ## Usage
//!
//! ```ignore
//! use dacc_jobs::{CcConfig, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(engine, aggregator, &CcConfig::load()?)?;
//! let handle = orchestrator.dispatch_day(request)?;
//! let report = handle.wait().await?;
//! ```

pub mod config;
pub mod engine;
pub mod events;
pub mod job;
pub mod orchestrator;
pub mod runlog;
pub mod tracker;

pub use config::{CcConfig, CoreConfig, EngineConfig, ExportConfig};
pub use engine::{
    failure_message, EngineError, EngineSuccess, FailureCause, OptimizationEngine, ReplayEngine,
    ScriptedOutcome,
};
pub use events::JobEvent;
pub use job::{
    DailyRequest, HourArtifacts, HourOutcome, HourlyErrorKind, HourlyInputs, HourlyJobRequest,
    HourlyJobResult, JobStatus,
};
pub use orchestrator::{AggregationReport, DailyAggregator, DayHandle, Orchestrator};
pub use runlog::{LogLevel, LogLine, RunLog};
pub use tracker::{Completion, CompletionTracker, DailyOutcome, DailyRequestState};
